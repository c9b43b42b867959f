use serde_json::Value;
use tracing::instrument;

use aula_academy::patch::apply_patch;
use aula_academy::{EnrollmentStatus, NewPayment, Payment};
use aula_auth::fields::check_patch;
use aula_auth::permissions::{PAYMENTS_CREATE, PAYMENTS_READ, PAYMENTS_READ_OWN, PAYMENTS_UPDATE};
use aula_auth::{authorize, Model, Principal};
use aula_core::{EnrollmentId, PaymentId};

use super::{now, require, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};
use crate::authz::scope;

impl AppServices {
    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn list_payments(
        &self,
        principal: &Principal,
        enrollment_id: Option<EnrollmentId>,
    ) -> ServiceResult<Vec<Payment>> {
        let scope = scope(principal, &PAYMENTS_READ, &PAYMENTS_READ_OWN)?;
        let payments = self.stores.payments.list().await?;
        Ok(payments
            .into_iter()
            .filter(|p| scope.allows(p.user_id))
            .filter(|p| enrollment_id.is_none_or(|id| p.enrollment_id == id))
            .collect())
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn get_payment(&self, principal: &Principal, id: PaymentId) -> ServiceResult<Payment> {
        let scope = scope(principal, &PAYMENTS_READ, &PAYMENTS_READ_OWN)?;
        let payment = require(&*self.stores.payments, id, "payment").await?;
        if !scope.allows(payment.user_id) {
            return Err(ServiceError::not_found("payment"));
        }
        Ok(payment)
    }

    /// Register a pending payment. The payer is the enrollment's user.
    #[instrument(skip(self, principal, input), fields(caller = %principal.user_id), err)]
    pub async fn create_payment(&self, principal: &Principal, input: NewPayment) -> ServiceResult<Payment> {
        authorize(principal, &PAYMENTS_CREATE)?;
        let enrollment = require(&*self.stores.enrollments, input.enrollment_id, "enrollment").await?;
        if !principal.is_admin() && enrollment.user_id != principal.user_id {
            return Err(ServiceError::forbidden("payments can only be registered for your own enrollments"));
        }
        if enrollment.status == EnrollmentStatus::Cancelled {
            return Err(ServiceError::conflict("enrollment is cancelled"));
        }

        let payment = input.into_payment(enrollment.user_id, now())?;
        let payment = self.stores.payments.insert(payment).await?;
        tracing::info!(
            payment_id = %payment.id,
            enrollment_id = %payment.enrollment_id,
            amount_cents = payment.amount_cents,
            "payment registered"
        );
        Ok(payment)
    }

    /// Review a payment. Approving a pending payment confirms a pre-enrolled
    /// seat.
    #[instrument(skip(self, principal, patch), fields(caller = %principal.user_id), err)]
    pub async fn update_payment(&self, principal: &Principal, id: PaymentId, patch: &Value) -> ServiceResult<Payment> {
        authorize(principal, &PAYMENTS_UPDATE)?;
        check_patch(principal.role, Model::Payment, patch)?;

        let current = require(&*self.stores.payments, id, "payment").await?;
        let patched: Payment = apply_patch(&current, patch)?;
        let updated = patched.apply_transition(&current, now())?;
        let updated = self.stores.payments.update(updated).await?;

        if updated.just_approved(&current) {
            let _guard = self.enrollments_lock.lock().await;
            let enrollment = require(&*self.stores.enrollments, updated.enrollment_id, "enrollment").await?;
            if enrollment.status == EnrollmentStatus::PreEnrolled {
                let enrollment = self
                    .stores
                    .enrollments
                    .update(aula_academy::Enrollment {
                        status: EnrollmentStatus::Enrolled,
                        ..enrollment
                    })
                    .await?;
                tracing::info!(enrollment_id = %enrollment.id, payment_id = %id, "enrollment confirmed by payment");
            }
        }
        Ok(updated)
    }
}
