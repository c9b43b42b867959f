use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use aula_academy::patch::apply_patch;
use aula_academy::{Answers, Enrollment, Response};
use aula_auth::fields::check_patch;
use aula_auth::permissions::{ENROLLMENTS_CREATE, ENROLLMENTS_READ, ENROLLMENTS_READ_OWN, ENROLLMENTS_UPDATE};
use aula_auth::{authorize, Model, Principal, Role};
use aula_core::{CommissionId, EnrollmentId, UserId};

use super::{now, require, today, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};
use crate::authz::scope;

/// Body of a preinscription. `user_id` lets an administrator enroll someone
/// else; everybody else enrolls themselves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preinscription {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub answers: Answers,
}

impl AppServices {
    /// Pre-enroll a user in an open commission, storing the intake response
    /// when the commission has a form.
    #[instrument(skip(self, principal, request), fields(caller = %principal.user_id), err)]
    pub async fn preinscribe(
        &self,
        principal: &Principal,
        commission_id: CommissionId,
        request: Preinscription,
    ) -> ServiceResult<(Enrollment, Option<Response>)> {
        authorize(principal, &ENROLLMENTS_CREATE)?;
        let user_id = match request.user_id {
            Some(other) if other != principal.user_id => {
                if !principal.is_admin() {
                    return Err(ServiceError::forbidden("only administrators may enroll other users"));
                }
                other
            }
            _ => principal.user_id,
        };

        let user = require(&*self.stores.users, user_id, "user").await?;
        if user.role != Role::Student {
            return Err(ServiceError::conflict("only students can be enrolled"));
        }

        // Commission capacity, status and form are only read under the lock.
        let _guard = self.enrollments_lock.lock().await;
        let commission = require(&*self.stores.commissions, commission_id, "commission").await?;
        if !commission.is_enrollment_open(today()) {
            return Err(ServiceError::conflict("commission is not accepting enrollments"));
        }
        let seats: Vec<Enrollment> = self
            .stores
            .enrollments
            .list()
            .await?
            .into_iter()
            .filter(|e| e.commission_id == commission_id && e.is_active())
            .collect();
        if seats.iter().any(|e| e.user_id == user_id) {
            return Err(ServiceError::conflict("user is already enrolled in this commission"));
        }
        if seats.len() >= commission.capacity as usize {
            return Err(ServiceError::conflict("commission is full"));
        }

        let response = match commission.form_id {
            Some(form_id) => {
                let form = require(&*self.stores.forms, form_id, "form").await?;
                let response = Response::submit(&form, commission_id, user_id, request.answers, now())?;
                Some(self.stores.responses.insert(response).await?)
            }
            None => None,
        };

        let enrollment = Enrollment::pre_enroll(user_id, commission_id, response.as_ref().map(|r| r.id), now());
        let enrollment = match self.stores.enrollments.insert(enrollment).await {
            Ok(enrollment) => enrollment,
            Err(e) => {
                if let Some(r) = &response {
                    if let Err(cleanup) = self.stores.responses.delete(r.id).await {
                        tracing::warn!(response_id = %r.id, error = %cleanup, "orphaned intake response");
                    }
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            enrollment_id = %enrollment.id,
            commission_id = %commission_id,
            user_id = %user_id,
            "pre-enrolled"
        );
        Ok((enrollment, response))
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn list_enrollments(
        &self,
        principal: &Principal,
        commission_id: Option<CommissionId>,
    ) -> ServiceResult<Vec<Enrollment>> {
        let scope = scope(principal, &ENROLLMENTS_READ, &ENROLLMENTS_READ_OWN)?;
        let enrollments = self.stores.enrollments.list().await?;
        Ok(enrollments
            .into_iter()
            .filter(|e| scope.allows(e.user_id))
            .filter(|e| commission_id.is_none_or(|id| e.commission_id == id))
            .collect())
    }

    /// Rows outside the caller's scope read as missing.
    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn get_enrollment(&self, principal: &Principal, id: EnrollmentId) -> ServiceResult<Enrollment> {
        let scope = scope(principal, &ENROLLMENTS_READ, &ENROLLMENTS_READ_OWN)?;
        let enrollment = require(&*self.stores.enrollments, id, "enrollment").await?;
        if !scope.allows(enrollment.user_id) {
            return Err(ServiceError::not_found("enrollment"));
        }
        Ok(enrollment)
    }

    /// Patch an enrollment: administrators any, teachers those of the
    /// commissions they teach, students their own.
    #[instrument(skip(self, principal, patch), fields(caller = %principal.user_id), err)]
    pub async fn update_enrollment(
        &self,
        principal: &Principal,
        id: EnrollmentId,
        patch: &Value,
    ) -> ServiceResult<Enrollment> {
        authorize(principal, &ENROLLMENTS_UPDATE)?;
        check_patch(principal.role, Model::Enrollment, patch)?;

        let _guard = self.enrollments_lock.lock().await;
        let current = require(&*self.stores.enrollments, id, "enrollment").await?;
        if !principal.is_admin() {
            let allowed = match principal.role {
                Role::Student => current.user_id == principal.user_id,
                _ => {
                    let commission = require(&*self.stores.commissions, current.commission_id, "commission").await?;
                    commission.teacher_id == Some(principal.user_id)
                }
            };
            if !allowed {
                return Err(ServiceError::forbidden("enrollment is outside your commissions"));
            }
        }

        let mut updated: Enrollment = apply_patch(&current, patch)?;
        updated.validate_update(&current)?;
        updated.notes = updated.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let updated = self.stores.enrollments.update(updated).await?;
        if updated.status != current.status {
            tracing::info!(
                enrollment_id = %id,
                from = current.status.as_str(),
                to = updated.status.as_str(),
                "enrollment status changed"
            );
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{admin, answers_for, principal_of, seed_form, seed_open_commission, seed_user, services};
    use super::*;
    use aula_academy::EnrollmentStatus;
    use serde_json::json;

    #[tokio::test]
    async fn preinscription_stores_response_and_pre_enrolls() {
        let services = services();
        let form = seed_form(&services).await;
        let commission = seed_open_commission(&services, None, Some(&form), 10).await;
        let student = seed_user(&services, "s@aula.test", Role::Student).await;

        let request = Preinscription {
            user_id: None,
            answers: answers_for(&form),
        };
        let (enrollment, response) = services
            .preinscribe(&principal_of(&student), commission.id, request)
            .await
            .unwrap();
        let response = response.unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::PreEnrolled);
        assert_eq!(enrollment.user_id, student.id);
        assert_eq!(enrollment.response_id, Some(response.id));
        assert_eq!(response.form_id, form.id);
    }

    #[tokio::test]
    async fn invalid_answers_create_nothing() {
        let services = services();
        let form = seed_form(&services).await;
        let commission = seed_open_commission(&services, None, Some(&form), 10).await;
        let student = seed_user(&services, "s@aula.test", Role::Student).await;

        let err = services
            .preinscribe(&principal_of(&student), commission.id, Preinscription::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(services.list_enrollments(&admin(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_and_full_commissions_conflict() {
        let services = services();
        let commission = seed_open_commission(&services, None, None, 1).await;
        let a = seed_user(&services, "a@aula.test", Role::Student).await;
        let b = seed_user(&services, "b@aula.test", Role::Student).await;

        services
            .preinscribe(&principal_of(&a), commission.id, Preinscription::default())
            .await
            .unwrap();
        assert!(matches!(
            services.preinscribe(&principal_of(&a), commission.id, Preinscription::default()).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            services.preinscribe(&principal_of(&b), commission.id, Preinscription::default()).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_seats_are_released() {
        let services = services();
        let commission = seed_open_commission(&services, None, None, 1).await;
        let a = seed_user(&services, "a@aula.test", Role::Student).await;
        let b = seed_user(&services, "b@aula.test", Role::Student).await;

        let (seat, _) = services
            .preinscribe(&principal_of(&a), commission.id, Preinscription::default())
            .await
            .unwrap();
        services
            .update_enrollment(&principal_of(&a), seat.id, &json!({"status": "cancelled"}))
            .await
            .unwrap();
        services
            .preinscribe(&principal_of(&b), commission.id, Preinscription::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn closed_commissions_reject_preinscriptions() {
        let services = services();
        let commission = seed_open_commission(&services, None, None, 5).await;
        services
            .update_commission(&admin(), commission.id, &json!({"status": "closed"}))
            .await
            .unwrap();
        let student = seed_user(&services, "s@aula.test", Role::Student).await;
        assert!(matches!(
            services.preinscribe(&principal_of(&student), commission.id, Preinscription::default()).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn only_admins_enroll_on_behalf_of_others() {
        let services = services();
        let commission = seed_open_commission(&services, None, None, 5).await;
        let a = seed_user(&services, "a@aula.test", Role::Student).await;
        let b = seed_user(&services, "b@aula.test", Role::Student).await;

        let on_behalf = Preinscription {
            user_id: Some(b.id),
            answers: Answers::new(),
        };
        assert!(matches!(
            services.preinscribe(&principal_of(&a), commission.id, on_behalf.clone()).await,
            Err(ServiceError::Forbidden(_))
        ));
        let (seat, _) = services.preinscribe(&admin(), commission.id, on_behalf).await.unwrap();
        assert_eq!(seat.user_id, b.id);
    }

    #[tokio::test]
    async fn row_scope_and_patch_rules() {
        let services = services();
        let teacher = seed_user(&services, "t@aula.test", Role::Teacher).await;
        let commission = seed_open_commission(&services, Some(&teacher), None, 5).await;
        let a = seed_user(&services, "a@aula.test", Role::Student).await;
        let b = seed_user(&services, "b@aula.test", Role::Student).await;
        let (seat_a, _) = services
            .preinscribe(&principal_of(&a), commission.id, Preinscription::default())
            .await
            .unwrap();
        services
            .preinscribe(&principal_of(&b), commission.id, Preinscription::default())
            .await
            .unwrap();

        assert_eq!(services.list_enrollments(&principal_of(&a), None).await.unwrap().len(), 1);
        assert_eq!(services.list_enrollments(&principal_of(&teacher), None).await.unwrap().len(), 2);
        assert!(matches!(
            services.get_enrollment(&principal_of(&b), seat_a.id).await,
            Err(ServiceError::NotFound(_))
        ));

        // Students may only cancel.
        assert!(matches!(
            services
                .update_enrollment(&principal_of(&a), seat_a.id, &json!({"status": "approved"}))
                .await,
            Err(ServiceError::FieldPolicy(_))
        ));
        assert!(matches!(
            services
                .update_enrollment(&principal_of(&b), seat_a.id, &json!({"status": "cancelled"}))
                .await,
            Err(ServiceError::Forbidden(_))
        ));

        let enrolled = services
            .update_enrollment(&admin(), seat_a.id, &json!({"status": "enrolled"}))
            .await
            .unwrap();
        assert_eq!(enrolled.status, EnrollmentStatus::Enrolled);
        let graded = services
            .update_enrollment(&principal_of(&teacher), seat_a.id, &json!({"status": "approved", "grade": 9}))
            .await
            .unwrap();
        assert_eq!((graded.status, graded.grade), (EnrollmentStatus::Approved, Some(9)));
    }
}
