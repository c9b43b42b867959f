use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aula_core::{EnrollmentId, Entity, PaymentId, UserId, ValidationErrors};

pub const DEFAULT_CURRENCY: &str = "ARS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Pending, Approved) | (Pending, Rejected) | (Approved, Refunded)
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub amount_cents: u64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> PaymentId {
        self.id
    }
}

/// Payment registration input. The payer is taken from the enrollment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub enrollment_id: EnrollmentId,
    pub amount_cents: u64,
    #[serde(default)]
    pub currency: Option<String>,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

impl NewPayment {
    pub fn into_payment(self, user_id: UserId, now: DateTime<Utc>) -> Result<Payment, ValidationErrors> {
        let payment = Payment {
            id: PaymentId::new(),
            enrollment_id: self.enrollment_id,
            user_id,
            amount_cents: self.amount_cents,
            currency: self
                .currency
                .map(|c| c.trim().to_string())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            method: self.method,
            status: PaymentStatus::Pending,
            reference: self
                .reference
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            paid_at: None,
            created_at: now,
        };
        payment.validate()?;
        Ok(payment)
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

impl Payment {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(self.amount_cents > 0, "amount_cents", "must be positive");
        errors.check(
            is_currency_code(&self.currency),
            "currency",
            "must be a three-letter ISO-4217 code",
        );
        errors.into_result()
    }

    /// Validate `self` as the patched successor of `previous` and stamp
    /// `paid_at` on approval.
    pub fn apply_transition(mut self, previous: &Payment, now: DateTime<Utc>) -> Result<Payment, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            previous.status.can_transition_to(self.status),
            "status",
            format!(
                "cannot move from {} to {}",
                previous.status.as_str(),
                self.status.as_str()
            ),
        );
        if let Err(e) = self.validate() {
            errors.extend(e);
        }
        errors.into_result()?;

        if self.status == PaymentStatus::Approved && previous.status != PaymentStatus::Approved {
            self.paid_at = Some(now);
        }
        Ok(self)
    }

    /// Whether this update is the approval that may promote the enrollment.
    pub fn just_approved(&self, previous: &Payment) -> bool {
        self.status == PaymentStatus::Approved && previous.status == PaymentStatus::Pending
    }
}
