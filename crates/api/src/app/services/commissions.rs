use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use aula_academy::patch::apply_patch;
use aula_academy::{
    Commission, CommissionDraft, CommissionStatus, Enrollment, NewCommission, RescheduleInput, StepInput,
    WizardStep,
};
use aula_auth::fields::check_patch;
use aula_auth::permissions::{COMMISSIONS_READ, COMMISSIONS_WRITE, ENROLLMENTS_READ};
use aula_auth::{authorize, Model, Principal, Role};
use aula_core::{CommissionId, CourseId, FormId, UserId, ValidationErrors};

use super::{now, require, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};

/// Drafts are internal until an administrator opens them.
fn visible_to(principal: &Principal, commission: &Commission) -> bool {
    principal.role != Role::Student || commission.status != CommissionStatus::Draft
}

fn step_data<T: DeserializeOwned>(step: WizardStep, data: Value) -> ServiceResult<T> {
    let data = if data.is_null() { Value::Object(Default::default()) } else { data };
    serde_json::from_value(data)
        .map_err(|e| ServiceError::BadRequest(format!("invalid data for step {step}: {e}")))
}

fn step_input(step: WizardStep, data: Value) -> ServiceResult<StepInput> {
    Ok(match step {
        WizardStep::General => StepInput::General(step_data(step, data)?),
        WizardStep::Dates => StepInput::Dates(step_data(step, data)?),
        WizardStep::Schedule => StepInput::Schedule(step_data(step, data)?),
        WizardStep::Form => StepInput::Form(step_data(step, data)?),
        WizardStep::Review => StepInput::Review,
    })
}

impl AppServices {
    async fn check_course(&self, errors: &mut ValidationErrors, field: &str, id: CourseId) -> ServiceResult<()> {
        match self.stores.courses.get(id).await? {
            None => errors.push(field, "course does not exist"),
            Some(course) => errors.check(course.accepts_commissions(), field, "course is archived"),
        }
        Ok(())
    }

    async fn check_teacher(&self, errors: &mut ValidationErrors, field: &str, id: UserId) -> ServiceResult<()> {
        match self.stores.users.get(id).await? {
            None => errors.push(field, "user does not exist"),
            Some(user) => errors.check(user.role == Role::Teacher, field, "user is not a teacher"),
        }
        Ok(())
    }

    async fn check_form(&self, errors: &mut ValidationErrors, field: &str, id: FormId) -> ServiceResult<()> {
        let exists = self.stores.forms.get(id).await?.is_some();
        errors.check(exists, field, "form does not exist");
        Ok(())
    }

    /// Records referenced by a finished draft, reported under wizard paths.
    async fn check_references(&self, new: &NewCommission) -> ServiceResult<()> {
        let mut errors = ValidationErrors::new();
        self.check_course(&mut errors, "general.course_id", new.course_id).await?;
        if let Some(teacher_id) = new.teacher_id {
            self.check_teacher(&mut errors, "general.teacher_id", teacher_id).await?;
        }
        if let Some(form_id) = new.form_id {
            self.check_form(&mut errors, "form.form_id", form_id).await?;
        }
        Ok(errors.into_result()?)
    }

    async fn enrollments_of(&self, id: CommissionId) -> ServiceResult<Vec<Enrollment>> {
        let enrollments = self.stores.enrollments.list().await?;
        Ok(enrollments.into_iter().filter(|e| e.commission_id == id).collect())
    }

    /// Validate one wizard step against the steps collected so far and return
    /// the step that follows it.
    #[instrument(skip(self, principal, data, draft), fields(caller = %principal.user_id), err)]
    pub async fn validate_wizard_step(
        &self,
        principal: &Principal,
        step: WizardStep,
        data: Value,
        mut draft: CommissionDraft,
    ) -> ServiceResult<WizardStep> {
        authorize(principal, &COMMISSIONS_WRITE)?;
        draft.set(step_input(step, data)?);

        match step {
            WizardStep::Form | WizardStep::Review => {
                let new = draft.finish()?;
                self.check_references(&new).await?;
            }
            WizardStep::General => {
                draft.validate_step(step)?;
                let mut errors = ValidationErrors::new();
                if let Some(general) = &draft.general {
                    if let Ok(course_id) = general.course_id.trim().parse::<CourseId>() {
                        self.check_course(&mut errors, "general.course_id", course_id).await?;
                    }
                    let teacher = general.teacher_id.as_deref().map(str::trim).filter(|t| !t.is_empty());
                    if let Some(Ok(teacher_id)) = teacher.map(str::parse::<UserId>) {
                        self.check_teacher(&mut errors, "general.teacher_id", teacher_id).await?;
                    }
                }
                errors.into_result()?;
            }
            WizardStep::Dates | WizardStep::Schedule => draft.validate_step(step)?,
        }
        Ok(step.next())
    }

    #[instrument(skip(self, principal, draft), fields(caller = %principal.user_id), err)]
    pub async fn create_commission(&self, principal: &Principal, draft: CommissionDraft) -> ServiceResult<Commission> {
        authorize(principal, &COMMISSIONS_WRITE)?;
        let new = draft.finish()?;
        self.check_references(&new).await?;

        let commission = self.stores.commissions.insert(new.into_commission(now())).await?;
        tracing::info!(
            commission_id = %commission.id,
            course_id = %commission.course_id,
            "commission created"
        );
        Ok(commission)
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn list_commissions(
        &self,
        principal: &Principal,
        course_id: Option<CourseId>,
    ) -> ServiceResult<Vec<Commission>> {
        authorize(principal, &COMMISSIONS_READ)?;
        let commissions = self.stores.commissions.list().await?;
        Ok(commissions
            .into_iter()
            .filter(|c| course_id.is_none_or(|id| c.course_id == id))
            .filter(|c| visible_to(principal, c))
            .collect())
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn get_commission(&self, principal: &Principal, id: CommissionId) -> ServiceResult<Commission> {
        authorize(principal, &COMMISSIONS_READ)?;
        let commission = require(&*self.stores.commissions, id, "commission").await?;
        if !visible_to(principal, &commission) {
            return Err(ServiceError::not_found("commission"));
        }
        Ok(commission)
    }

    /// Patch a commission. Without `commissions.write` only the assigned
    /// teacher may edit, and only what the field policy allows.
    #[instrument(skip(self, principal, patch), fields(caller = %principal.user_id), err)]
    pub async fn update_commission(
        &self,
        principal: &Principal,
        id: CommissionId,
        patch: &Value,
    ) -> ServiceResult<Commission> {
        authorize(principal, &COMMISSIONS_READ)?;
        check_patch(principal.role, Model::Commission, patch)?;

        let _guard = self.enrollments_lock.lock().await;
        let current = require(&*self.stores.commissions, id, "commission").await?;
        if !principal.has(&COMMISSIONS_WRITE) && current.teacher_id != Some(principal.user_id) {
            return Err(ServiceError::forbidden("only the assigned teacher may edit this commission"));
        }

        let updated: Commission = apply_patch(&current, patch)?;
        updated.validate()?;

        let mut errors = ValidationErrors::new();
        if let Some(teacher_id) = updated.teacher_id.filter(|t| Some(*t) != current.teacher_id) {
            self.check_teacher(&mut errors, "teacher_id", teacher_id).await?;
        }
        if let Some(form_id) = updated.form_id.filter(|f| Some(*f) != current.form_id) {
            self.check_form(&mut errors, "form_id", form_id).await?;
        }
        errors.into_result()?;

        if updated.form_id != current.form_id || updated.capacity < current.capacity {
            let enrollments = self.enrollments_of(id).await?;
            if updated.form_id != current.form_id && !enrollments.is_empty() {
                return Err(ServiceError::conflict("the intake form cannot change once users have enrolled"));
            }
            let active = enrollments.iter().filter(|e| e.is_active()).count();
            if (updated.capacity as usize) < active {
                return Err(ServiceError::conflict(format!(
                    "capacity {} is below the {active} active enrollments",
                    updated.capacity
                )));
            }
        }

        Ok(self.stores.commissions.update(updated).await?)
    }

    /// Replace dates and sessions, re-running the wizard's calendar checks.
    #[instrument(skip(self, principal, input), fields(caller = %principal.user_id), err)]
    pub async fn reschedule_commission(
        &self,
        principal: &Principal,
        id: CommissionId,
        input: RescheduleInput,
    ) -> ServiceResult<Commission> {
        authorize(principal, &COMMISSIONS_WRITE)?;
        let calendar = input.validate()?;
        let _guard = self.enrollments_lock.lock().await;
        let mut commission = require(&*self.stores.commissions, id, "commission").await?;
        commission.reschedule(calendar);
        commission.validate()?;
        let commission = self.stores.commissions.update(commission).await?;
        tracing::info!(commission_id = %id, "commission rescheduled");
        Ok(commission)
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn delete_commission(&self, principal: &Principal, id: CommissionId) -> ServiceResult<()> {
        authorize(principal, &COMMISSIONS_WRITE)?;
        let _guard = self.enrollments_lock.lock().await;
        require(&*self.stores.commissions, id, "commission").await?;
        if !self.enrollments_of(id).await?.is_empty() {
            return Err(ServiceError::conflict("commission has enrollments; close it instead"));
        }
        self.stores.commissions.delete(id).await?;
        Ok(())
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn commission_enrollments(
        &self,
        principal: &Principal,
        id: CommissionId,
    ) -> ServiceResult<Vec<Enrollment>> {
        authorize(principal, &ENROLLMENTS_READ)?;
        require(&*self.stores.commissions, id, "commission").await?;
        self.enrollments_of(id).await
    }
}
