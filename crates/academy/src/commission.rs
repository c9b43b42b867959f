use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use aula_core::{CommissionId, CourseId, Entity, FormId, UserId, ValidationErrors};

use crate::schedule::{self, Session};
use crate::wizard::Calendar;

pub const MAX_CAPACITY: u32 = 500;
pub const MAX_NAME_LEN: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Online,
    Hybrid,
}

impl core::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in_person" => Ok(Modality::InPerson),
            "online" => Ok(Modality::Online),
            "hybrid" => Ok(Modality::Hybrid),
            other => Err(format!("unknown modality '{other}'")),
        }
    }
}

/// Commission lifecycle. Only `open` commissions take pre-enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    #[default]
    Draft,
    Open,
    Closed,
    Finished,
}

/// A scheduled cohort of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    pub course_id: CourseId,
    pub name: String,
    pub teacher_id: Option<UserId>,
    pub modality: Modality,
    pub status: CommissionStatus,
    pub capacity: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub enrollment_opens: NaiveDate,
    pub enrollment_closes: NaiveDate,
    pub sessions: Vec<Session>,
    pub form_id: Option<FormId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Commission {
    type Id = CommissionId;

    fn id(&self) -> CommissionId {
        self.id
    }
}

/// Fully validated wizard output, ready to become a [`Commission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommission {
    pub course_id: CourseId,
    pub name: String,
    pub teacher_id: Option<UserId>,
    pub modality: Modality,
    pub capacity: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub enrollment_opens: NaiveDate,
    pub enrollment_closes: NaiveDate,
    pub sessions: Vec<Session>,
    pub form_id: Option<FormId>,
    pub notes: Option<String>,
}

impl NewCommission {
    pub fn into_commission(self, now: DateTime<Utc>) -> Commission {
        Commission {
            id: CommissionId::new(),
            course_id: self.course_id,
            name: self.name,
            teacher_id: self.teacher_id,
            modality: self.modality,
            status: CommissionStatus::Draft,
            capacity: self.capacity,
            start_date: self.start_date,
            end_date: self.end_date,
            enrollment_opens: self.enrollment_opens,
            enrollment_closes: self.enrollment_closes,
            sessions: self.sessions,
            form_id: self.form_id,
            notes: self.notes,
            created_at: now,
        }
    }
}

/// Calendar-dependent rules shared by the wizard and by rescheduling.
pub fn check_dates(
    start_date: NaiveDate,
    end_date: NaiveDate,
    enrollment_opens: NaiveDate,
    enrollment_closes: NaiveDate,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(start_date < end_date, "end_date", "must be after start_date");
    errors.check(
        enrollment_opens <= enrollment_closes,
        "enrollment_closes",
        "must not be before enrollment_opens",
    );
    errors.check(
        enrollment_closes <= start_date,
        "enrollment_closes",
        "must not be after start_date",
    );
    errors
}

/// At least one session must fall inside the commission's date range.
pub fn check_calendar(start_date: NaiveDate, end_date: NaiveDate, sessions: &[Session]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if start_date < end_date && !schedule::has_class_day(start_date, end_date, sessions) {
        errors.push("sessions", "no session falls between start_date and end_date");
    }
    errors
}

impl Commission {
    /// Validate a (possibly patched) record, schedule included.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "cannot be empty");
        errors.check(
            self.name.chars().count() <= MAX_NAME_LEN,
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        );
        errors.check(
            (1..=MAX_CAPACITY).contains(&self.capacity),
            "capacity",
            format!("must be between 1 and {MAX_CAPACITY}"),
        );
        errors.extend(check_dates(
            self.start_date,
            self.end_date,
            self.enrollment_opens,
            self.enrollment_closes,
        ));
        errors.extend(schedule::check_sessions(&self.sessions));
        errors.extend(check_calendar(self.start_date, self.end_date, &self.sessions));
        errors.into_result()
    }

    /// Whether a pre-enrollment submitted on `today` is accepted.
    pub fn is_enrollment_open(&self, today: NaiveDate) -> bool {
        self.status == CommissionStatus::Open
            && self.enrollment_opens <= today
            && today <= self.enrollment_closes
    }

    /// Replace dates and sessions with an already validated calendar.
    pub fn reschedule(&mut self, calendar: Calendar) {
        self.start_date = calendar.start_date;
        self.end_date = calendar.end_date;
        self.enrollment_opens = calendar.enrollment_opens;
        self.enrollment_closes = calendar.enrollment_closes;
        self.sessions = calendar.sessions;
    }

    pub fn weekly_minutes(&self) -> u32 {
        schedule::weekly_minutes(&self.sessions)
    }

    pub fn class_dates(&self) -> Vec<NaiveDate> {
        schedule::class_dates(self.start_date, self.end_date, &self.sessions)
    }

    pub fn class_count(&self) -> u64 {
        schedule::class_count(self.start_date, self.end_date, &self.sessions)
    }

    pub fn total_minutes(&self) -> u64 {
        schedule::total_minutes(self.start_date, self.end_date, &self.sessions)
    }
}
