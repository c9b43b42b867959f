use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aula_core::{CourseId, Entity, ValidationErrors};

/// Publication lifecycle of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub description: String,
    pub duration_weeks: u32,
    pub price_cents: u64,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

impl Entity for Course {
    type Id = CourseId;

    fn id(&self) -> CourseId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_weeks: u32,
    #[serde(default)]
    pub price_cents: u64,
}

impl NewCourse {
    pub fn into_course(self, now: DateTime<Utc>) -> Result<Course, ValidationErrors> {
        let course = Course {
            id: CourseId::new(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            duration_weeks: self.duration_weeks,
            price_cents: self.price_cents,
            status: CourseStatus::Draft,
            created_at: now,
        };
        course.validate()?;
        Ok(course)
    }
}

impl Course {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "cannot be empty");
        errors.check(self.name.chars().count() <= 120, "name", "must be at most 120 characters");
        errors.check(self.duration_weeks > 0, "duration_weeks", "must be positive");
        errors.into_result()
    }

    /// Archived courses do not get new commissions.
    pub fn accepts_commissions(&self) -> bool {
        self.status != CourseStatus::Archived
    }
}
