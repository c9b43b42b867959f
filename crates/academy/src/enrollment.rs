use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aula_core::{CommissionId, EnrollmentId, Entity, ResponseId, UserId, ValidationErrors};

pub const MAX_GRADE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    PreEnrolled,
    Enrolled,
    Cancelled,
    Approved,
    Failed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::PreEnrolled => "pre_enrolled",
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Cancelled => "cancelled",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnrollmentStatus::Cancelled | EnrollmentStatus::Approved | EnrollmentStatus::Failed
        )
    }

    /// Allowed lifecycle moves. Staying in the same state is always allowed so
    /// a PATCH that only touches `grade` or `notes` can echo the status back.
    pub fn can_transition_to(&self, next: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        *self == next
            || matches!(
                (self, next),
                (PreEnrolled, Enrolled)
                    | (PreEnrolled, Cancelled)
                    | (Enrolled, Cancelled)
                    | (Enrolled, Approved)
                    | (Enrolled, Failed)
            )
    }
}

/// A user's seat in a commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub commission_id: CommissionId,
    pub response_id: Option<ResponseId>,
    pub status: EnrollmentStatus,
    pub grade: Option<u8>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Enrollment {
    type Id = EnrollmentId;

    fn id(&self) -> EnrollmentId {
        self.id
    }
}

impl Enrollment {
    /// Outcome of a successful preinscription.
    pub fn pre_enroll(
        user_id: UserId,
        commission_id: CommissionId,
        response_id: Option<ResponseId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EnrollmentId::new(),
            user_id,
            commission_id,
            response_id,
            status: EnrollmentStatus::PreEnrolled,
            grade: None,
            notes: None,
            created_at: now,
        }
    }

    /// Everything but cancelled seats counts against capacity.
    pub fn is_active(&self) -> bool {
        self.status != EnrollmentStatus::Cancelled
    }

    /// Validate `self` as the patched successor of `previous`.
    pub fn validate_update(&self, previous: &Enrollment) -> Result<(), ValidationErrors> {
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
        if let Some(grade) = self.grade {
            errors.check(grade <= MAX_GRADE, "grade", format!("must be between 0 and {MAX_GRADE}"));
        }
        errors.into_result()
    }
}
