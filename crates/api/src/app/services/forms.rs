use serde_json::Value;
use tracing::instrument;

use aula_academy::form::build_stages;
use aula_academy::patch::apply_patch;
use aula_academy::{validate_stage, Answers, Form, NewForm, NewStage};
use aula_auth::fields::check_patch;
use aula_auth::permissions::{FORMS_READ, FORMS_WRITE};
use aula_auth::{authorize, Model, Principal};
use aula_core::FormId;

use super::{now, require, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};

impl AppServices {
    async fn has_responses(&self, id: FormId) -> ServiceResult<bool> {
        Ok(self.stores.responses.list().await?.iter().any(|r| r.form_id == id))
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn list_forms(&self, principal: &Principal) -> ServiceResult<Vec<Form>> {
        authorize(principal, &FORMS_READ)?;
        Ok(self.stores.forms.list().await?)
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn get_form(&self, principal: &Principal, id: FormId) -> ServiceResult<Form> {
        authorize(principal, &FORMS_READ)?;
        require(&*self.stores.forms, id, "form").await
    }

    #[instrument(skip(self, principal, input), fields(caller = %principal.user_id), err)]
    pub async fn create_form(&self, principal: &Principal, input: NewForm) -> ServiceResult<Form> {
        authorize(principal, &FORMS_WRITE)?;
        let form = self.stores.forms.insert(input.into_form(now())?).await?;
        tracing::info!(form_id = %form.id, stages = form.stages.len(), "form created");
        Ok(form)
    }

    /// Title and description only; stages go through [`Self::replace_stages`].
    #[instrument(skip(self, principal, patch), fields(caller = %principal.user_id), err)]
    pub async fn update_form(&self, principal: &Principal, id: FormId, patch: &Value) -> ServiceResult<Form> {
        authorize(principal, &FORMS_WRITE)?;
        check_patch(principal.role, Model::Form, patch)?;
        let current = require(&*self.stores.forms, id, "form").await?;
        let mut updated: Form = apply_patch(&current, patch)?;
        updated.title = updated.title.trim().to_string();
        updated.description = updated
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        updated.validate()?;
        Ok(self.stores.forms.update(updated).await?)
    }

    /// Replace the stage structure. Question ids are reassigned, so this is
    /// refused once answers reference the current ones.
    #[instrument(skip(self, principal, stages), fields(caller = %principal.user_id), err)]
    pub async fn replace_stages(&self, principal: &Principal, id: FormId, stages: Vec<NewStage>) -> ServiceResult<Form> {
        authorize(principal, &FORMS_WRITE)?;
        let mut form = require(&*self.stores.forms, id, "form").await?;
        if self.has_responses(id).await? {
            return Err(ServiceError::conflict("form already has responses"));
        }
        form.stages = build_stages(stages)?;
        Ok(self.stores.forms.update(form).await?)
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn delete_form(&self, principal: &Principal, id: FormId) -> ServiceResult<()> {
        authorize(principal, &FORMS_WRITE)?;
        require(&*self.stores.forms, id, "form").await?;
        let attached = self
            .stores
            .commissions
            .list()
            .await?
            .iter()
            .any(|c| c.form_id == Some(id));
        if attached {
            return Err(ServiceError::conflict("form is attached to a commission"));
        }
        if self.has_responses(id).await? {
            return Err(ServiceError::conflict("form already has responses"));
        }
        self.stores.forms.delete(id).await?;
        Ok(())
    }

    /// Check the answers of one stage without storing anything.
    #[instrument(skip(self, principal, answers), fields(caller = %principal.user_id), err)]
    pub async fn validate_form_stage(
        &self,
        principal: &Principal,
        id: FormId,
        stage: usize,
        answers: &Answers,
    ) -> ServiceResult<()> {
        authorize(principal, &FORMS_READ)?;
        let form = require(&*self.stores.forms, id, "form").await?;
        validate_stage(&form, stage, answers)?;
        Ok(())
    }
}
