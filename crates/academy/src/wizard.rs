//! Commission-creation wizard.
//!
//! The admin UI collects a commission in five steps. Each step's input is kept
//! loosely typed (strings and plain numbers) so that bad values surface as
//! field errors instead of deserialization failures. Steps validate on their
//! own; entering `review` and finishing also run the cross-step calendar check.
//!
//! Error paths are prefixed with the step name, e.g. `general.capacity` or
//! `schedule.sessions[1].end_time`.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aula_core::{CourseId, DomainError, FormId, UserId, ValidationErrors};

use crate::commission::{self, Modality, NewCommission, MAX_CAPACITY, MAX_NAME_LEN};
use crate::schedule::{self, parse_hhmm, Session, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    General,
    Dates,
    Schedule,
    Form,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::General,
        WizardStep::Dates,
        WizardStep::Schedule,
        WizardStep::Form,
        WizardStep::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::General => "general",
            WizardStep::Dates => "dates",
            WizardStep::Schedule => "schedule",
            WizardStep::Form => "form",
            WizardStep::Review => "review",
        }
    }

    pub fn next(&self) -> WizardStep {
        match self {
            WizardStep::General => WizardStep::Dates,
            WizardStep::Dates => WizardStep::Schedule,
            WizardStep::Schedule => WizardStep::Form,
            WizardStep::Form | WizardStep::Review => WizardStep::Review,
        }
    }

    pub fn previous(&self) -> WizardStep {
        match self {
            WizardStep::General | WizardStep::Dates => WizardStep::General,
            WizardStep::Schedule => WizardStep::Dates,
            WizardStep::Form => WizardStep::Schedule,
            WizardStep::Review => WizardStep::Form,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralInput {
    pub course_id: String,
    pub name: String,
    pub teacher_id: Option<String>,
    pub modality: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatesInput {
    pub start_date: String,
    pub end_date: String,
    pub enrollment_opens: String,
    pub enrollment_closes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInput {
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleInput {
    pub sessions: Vec<SessionInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormInput {
    pub form_id: Option<String>,
}

/// Data submitted for one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    General(GeneralInput),
    Dates(DatesInput),
    Schedule(ScheduleInput),
    Form(FormInput),
    Review,
}

impl StepInput {
    pub fn step(&self) -> WizardStep {
        match self {
            StepInput::General(_) => WizardStep::General,
            StepInput::Dates(_) => WizardStep::Dates,
            StepInput::Schedule(_) => WizardStep::Schedule,
            StepInput::Form(_) => WizardStep::Form,
            StepInput::Review => WizardStep::Review,
        }
    }
}

struct General {
    course_id: CourseId,
    name: String,
    teacher_id: Option<UserId>,
    modality: Modality,
    capacity: u32,
}

struct Dates {
    start_date: NaiveDate,
    end_date: NaiveDate,
    enrollment_opens: NaiveDate,
    enrollment_closes: NaiveDate,
}

impl GeneralInput {
    fn validate(&self) -> Result<General, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let course_id = self.course_id.trim().parse::<CourseId>().ok();
        errors.check(course_id.is_some(), "course_id", "must be a valid id");

        let name = self.name.trim();
        errors.check(!name.is_empty(), "name", "cannot be empty");
        errors.check(
            name.chars().count() <= MAX_NAME_LEN,
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        );

        let teacher_id = match self.teacher_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<UserId>().map(Some).map_err(|_| ()),
        };
        errors.check(teacher_id.is_ok(), "teacher_id", "must be a valid id");

        let modality = self.modality.parse::<Modality>();
        if let Err(msg) = &modality {
            errors.push("modality", msg.clone());
        }

        let capacity = u32::try_from(self.capacity)
            .ok()
            .filter(|c| (1..=MAX_CAPACITY).contains(c));
        errors.check(
            capacity.is_some(),
            "capacity",
            format!("must be between 1 and {MAX_CAPACITY}"),
        );

        match (course_id, teacher_id, modality, capacity) {
            (Some(course_id), Ok(teacher_id), Ok(modality), Some(capacity)) if errors.is_empty() => {
                Ok(General {
                    course_id,
                    name: name.to_string(),
                    teacher_id,
                    modality,
                    capacity,
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_date(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let parsed = (raw.len() == 10)
        .then(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .flatten();
    errors.check(parsed.is_some(), field, "must be a date (YYYY-MM-DD)");
    parsed
}

impl DatesInput {
    fn validate(&self) -> Result<Dates, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let start = parse_date(&mut errors, "start_date", &self.start_date);
        let end = parse_date(&mut errors, "end_date", &self.end_date);
        let opens = parse_date(&mut errors, "enrollment_opens", &self.enrollment_opens);
        let closes = parse_date(&mut errors, "enrollment_closes", &self.enrollment_closes);

        let (Some(start_date), Some(end_date), Some(enrollment_opens), Some(enrollment_closes)) =
            (start, end, opens, closes)
        else {
            return Err(errors);
        };
        commission::check_dates(start_date, end_date, enrollment_opens, enrollment_closes).into_result()?;
        Ok(Dates {
            start_date,
            end_date,
            enrollment_opens,
            enrollment_closes,
        })
    }
}

impl ScheduleInput {
    fn validate(&self) -> Result<Vec<Session>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut sessions = Vec::with_capacity(self.sessions.len());

        for (i, input) in self.sessions.iter().enumerate() {
            let weekday = input.weekday.parse::<Weekday>();
            if let Err(msg) = &weekday {
                errors.push(format!("sessions[{i}].weekday"), msg.clone());
            }
            let start = parse_hhmm(&input.start_time);
            errors.check(start.is_some(), format!("sessions[{i}].start_time"), "must be a time (HH:MM)");
            let end = parse_hhmm(&input.end_time);
            errors.check(end.is_some(), format!("sessions[{i}].end_time"), "must be a time (HH:MM)");

            if let (Ok(weekday), Some(start_time), Some(end_time)) = (weekday, start, end) {
                sessions.push(Session {
                    weekday,
                    start_time,
                    end_time,
                });
            }
        }

        // Arithmetic checks only make sense once every session parsed.
        if errors.is_empty() {
            errors.extend(schedule::check_sessions(&sessions));
        }
        errors.into_result()?;
        Ok(sessions)
    }
}

impl FormInput {
    fn validate(&self) -> Result<Option<FormId>, ValidationErrors> {
        match self.form_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<FormId>()
                .map(Some)
                .map_err(|_| ValidationErrors::single("form_id", "must be a valid id")),
        }
    }
}

/// Everything the wizard collected. Also the body of a one-shot create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionDraft {
    pub general: Option<GeneralInput>,
    pub dates: Option<DatesInput>,
    pub schedule: Option<ScheduleInput>,
    pub form: Option<FormInput>,
    pub notes: Option<String>,
}

/// Run `check` on a present section, prefixing its errors with the step name.
fn section<I, T>(
    errors: &mut ValidationErrors,
    step: WizardStep,
    input: Option<&I>,
    check: impl FnOnce(&I) -> Result<T, ValidationErrors>,
) -> Option<T> {
    let Some(input) = input else {
        errors.push(step.as_str(), "step has not been completed");
        return None;
    };
    match check(input) {
        Ok(value) => Some(value),
        Err(e) => {
            errors.merge_prefixed(step.as_str(), e);
            None
        }
    }
}

impl CommissionDraft {
    pub fn set(&mut self, input: StepInput) {
        match input {
            StepInput::General(g) => self.general = Some(g),
            StepInput::Dates(d) => self.dates = Some(d),
            StepInput::Schedule(s) => self.schedule = Some(s),
            StepInput::Form(f) => self.form = Some(f),
            StepInput::Review => {}
        }
    }

    /// Validate a single step.
    ///
    /// `form` and `review` lead into (or are) the review screen, so they
    /// validate the whole draft including the calendar cross-check.
    pub fn validate_step(&self, step: WizardStep) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match step {
            WizardStep::General => {
                section(&mut errors, step, self.general.as_ref(), GeneralInput::validate);
            }
            WizardStep::Dates => {
                section(&mut errors, step, self.dates.as_ref(), DatesInput::validate);
            }
            WizardStep::Schedule => {
                section(&mut errors, step, self.schedule.as_ref(), ScheduleInput::validate);
            }
            WizardStep::Form | WizardStep::Review => return self.finish().map(|_| ()),
        }
        errors.into_result()
    }

    /// Re-validate every step, run the cross-step checks and produce the
    /// commission to create.
    pub fn finish(&self) -> Result<NewCommission, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let general = section(&mut errors, WizardStep::General, self.general.as_ref(), GeneralInput::validate);
        let dates = section(&mut errors, WizardStep::Dates, self.dates.as_ref(), DatesInput::validate);
        let sessions = section(&mut errors, WizardStep::Schedule, self.schedule.as_ref(), ScheduleInput::validate);
        // The form step is optional as a whole.
        let form_id = match &self.form {
            None => None,
            Some(input) => section(&mut errors, WizardStep::Form, Some(input), FormInput::validate).flatten(),
        };

        if let (Some(dates), Some(sessions)) = (&dates, &sessions) {
            errors.merge_prefixed(
                WizardStep::Schedule.as_str(),
                commission::check_calendar(dates.start_date, dates.end_date, sessions),
            );
        }

        match (general, dates, sessions) {
            (Some(general), Some(dates), Some(sessions)) if errors.is_empty() => Ok(NewCommission {
                course_id: general.course_id,
                name: general.name,
                teacher_id: general.teacher_id,
                modality: general.modality,
                capacity: general.capacity,
                start_date: dates.start_date,
                end_date: dates.end_date,
                enrollment_opens: dates.enrollment_opens,
                enrollment_closes: dates.enrollment_closes,
                sessions,
                form_id,
                notes: self
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            }),
            _ => Err(errors),
        }
    }
}

/// Dates plus sessions of an existing commission, validated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub enrollment_opens: NaiveDate,
    pub enrollment_closes: NaiveDate,
    pub sessions: Vec<Session>,
}

/// Body of a reschedule: the `dates` and `schedule` steps again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescheduleInput {
    pub dates: DatesInput,
    pub schedule: ScheduleInput,
}

impl RescheduleInput {
    pub fn validate(&self) -> Result<Calendar, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let dates = section(&mut errors, WizardStep::Dates, Some(&self.dates), DatesInput::validate);
        let sessions = section(&mut errors, WizardStep::Schedule, Some(&self.schedule), ScheduleInput::validate);
        if let (Some(dates), Some(sessions)) = (&dates, &sessions) {
            errors.merge_prefixed(
                WizardStep::Schedule.as_str(),
                commission::check_calendar(dates.start_date, dates.end_date, sessions),
            );
        }
        match (dates, sessions) {
            (Some(d), Some(sessions)) if errors.is_empty() => Ok(Calendar {
                start_date: d.start_date,
                end_date: d.end_date,
                enrollment_opens: d.enrollment_opens,
                enrollment_closes: d.enrollment_closes,
                sessions,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("expected data for step {expected}, got {got}")]
    OutOfOrder { expected: WizardStep, got: WizardStep },

    #[error("step {0} has not been reached yet")]
    NotReached(WizardStep),

    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),
}

impl From<WizardError> for DomainError {
    fn from(value: WizardError) -> Self {
        match value {
            WizardError::Invalid(errors) => DomainError::Validation(errors),
            other => DomainError::validation("step", other.to_string()),
        }
    }
}

/// Stateful driver over a [`CommissionDraft`].
///
/// Data is kept when moving back, and `goto` can jump to any step already
/// reached. Skipping ahead is not possible.
#[derive(Debug, Clone)]
pub struct CommissionWizard {
    current: WizardStep,
    reached: WizardStep,
    draft: CommissionDraft,
}

impl Default for CommissionWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CommissionWizard {
    pub fn new() -> Self {
        Self {
            current: WizardStep::General,
            reached: WizardStep::General,
            draft: CommissionDraft::default(),
        }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn draft(&self) -> &CommissionDraft {
        &self.draft
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.draft.notes = notes;
    }

    /// Store and validate the current step's data; advance on success.
    ///
    /// Invalid data is kept so the user can correct it in place.
    pub fn submit(&mut self, input: StepInput) -> Result<WizardStep, WizardError> {
        let got = input.step();
        if got != self.current {
            return Err(WizardError::OutOfOrder {
                expected: self.current,
                got,
            });
        }
        self.draft.set(input);
        self.draft.validate_step(self.current).map_err(WizardError::Invalid)?;

        self.current = self.current.next();
        self.reached = self.reached.max(self.current);
        Ok(self.current)
    }

    pub fn back(&mut self) -> WizardStep {
        self.current = self.current.previous();
        self.current
    }

    pub fn goto(&mut self, step: WizardStep) -> Result<WizardStep, WizardError> {
        if step > self.reached {
            return Err(WizardError::NotReached(step));
        }
        self.current = step;
        Ok(step)
    }

    pub fn finish(&self) -> Result<NewCommission, WizardError> {
        self.draft.finish().map_err(WizardError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general() -> GeneralInput {
        GeneralInput {
            course_id: CourseId::new().to_string(),
            name: " Turno noche ".into(),
            teacher_id: None,
            modality: "online".into(),
            capacity: 25,
        }
    }

    fn dates() -> DatesInput {
        DatesInput {
            start_date: "2026-03-02".into(),
            end_date: "2026-04-30".into(),
            enrollment_opens: "2026-02-01".into(),
            enrollment_closes: "2026-02-28".into(),
        }
    }

    fn session(weekday: &str, start: &str, end: &str) -> SessionInput {
        SessionInput {
            weekday: weekday.into(),
            start_time: start.into(),
            end_time: end.into(),
        }
    }

    fn schedule() -> ScheduleInput {
        ScheduleInput {
            sessions: vec![session("monday", "19:00", "21:00"), session("thursday", "19:00", "21:00")],
        }
    }

    fn complete_draft() -> CommissionDraft {
        CommissionDraft {
            general: Some(general()),
            dates: Some(dates()),
            schedule: Some(schedule()),
            form: None,
            notes: Some("  ".into()),
        }
    }

    #[test]
    fn happy_path_walks_every_step() {
        let mut wizard = CommissionWizard::new();
        assert_eq!(wizard.submit(StepInput::General(general())), Ok(WizardStep::Dates));
        assert_eq!(wizard.submit(StepInput::Dates(dates())), Ok(WizardStep::Schedule));
        assert_eq!(wizard.submit(StepInput::Schedule(schedule())), Ok(WizardStep::Form));
        assert_eq!(wizard.submit(StepInput::Form(FormInput::default())), Ok(WizardStep::Review));
        assert_eq!(wizard.submit(StepInput::Review), Ok(WizardStep::Review));

        let new = wizard.finish().unwrap();
        assert_eq!(new.name, "Turno noche");
        assert_eq!(new.capacity, 25);
        assert_eq!(new.sessions.len(), 2);
        assert_eq!(new.notes, None);
        assert_eq!(new.form_id, None);
    }

    #[test]
    fn cannot_skip_ahead() {
        let mut wizard = CommissionWizard::new();
        let err = wizard.submit(StepInput::Dates(dates())).unwrap_err();
        assert_eq!(
            err,
            WizardError::OutOfOrder {
                expected: WizardStep::General,
                got: WizardStep::Dates
            }
        );
        assert_eq!(wizard.goto(WizardStep::Schedule), Err(WizardError::NotReached(WizardStep::Schedule)));
    }

    #[test]
    fn back_keeps_data_and_goto_returns() {
        let mut wizard = CommissionWizard::new();
        wizard.submit(StepInput::General(general())).unwrap();
        wizard.submit(StepInput::Dates(dates())).unwrap();
        assert_eq!(wizard.back(), WizardStep::Dates);
        assert_eq!(wizard.back(), WizardStep::General);
        assert_eq!(wizard.back(), WizardStep::General);
        assert!(wizard.draft().dates.is_some());
        assert_eq!(wizard.goto(WizardStep::Schedule), Ok(WizardStep::Schedule));
    }

    #[test]
    fn invalid_step_stays_put_with_field_errors() {
        let mut wizard = CommissionWizard::new();
        let mut bad = general();
        bad.capacity = 0;
        bad.name = String::new();
        bad.modality = "remote".into();
        bad.course_id = "nope".into();
        let err = wizard.submit(StepInput::General(bad)).unwrap_err();
        let WizardError::Invalid(errs) = err else {
            panic!("expected validation errors");
        };
        for field in ["general.capacity", "general.name", "general.modality", "general.course_id"] {
            assert!(errs.has_field(field), "missing {field} in {errs}");
        }
        assert_eq!(wizard.current(), WizardStep::General);
        assert!(wizard.draft().general.is_some());
    }

    #[test]
    fn capacity_bounds() {
        for (capacity, ok) in [(1, true), (500, true), (501, false), (-3, false)] {
            let mut g = general();
            g.capacity = capacity;
            let draft = CommissionDraft { general: Some(g), ..Default::default() };
            assert_eq!(draft.validate_step(WizardStep::General).is_ok(), ok, "capacity {capacity}");
        }
    }

    #[test]
    fn date_ordering_is_enforced() {
        let mut d = dates();
        d.enrollment_closes = "2026-03-10".into();
        d.end_date = "2026-03-01".into();
        let draft = CommissionDraft { dates: Some(d), ..Default::default() };
        let errs = draft.validate_step(WizardStep::Dates).unwrap_err();
        assert!(errs.has_field("dates.end_date"));
        assert!(errs.has_field("dates.enrollment_closes"));

        let mut d = dates();
        d.start_date = "02/03/2026".into();
        let draft = CommissionDraft { dates: Some(d), ..Default::default() };
        assert!(draft.validate_step(WizardStep::Dates).unwrap_err().has_field("dates.start_date"));
    }

    #[test]
    fn schedule_time_arithmetic() {
        let draft = CommissionDraft {
            schedule: Some(ScheduleInput {
                sessions: vec![
                    session("monday", "19:00", "19:20"),
                    session("funday", "25:00", "9:00"),
                    session("tuesday", "18:00", "20:00"),
                    session("tuesday", "19:00", "21:00"),
                ],
            }),
            ..Default::default()
        };
        let errs = draft.validate_step(WizardStep::Schedule).unwrap_err();
        assert!(errs.has_field("schedule.sessions[1].weekday"));
        assert!(errs.has_field("schedule.sessions[1].start_time"));
        assert!(errs.has_field("schedule.sessions[1].end_time"));

        // Once everything parses, duration and overlap rules apply.
        let draft = CommissionDraft {
            schedule: Some(ScheduleInput {
                sessions: vec![
                    session("monday", "19:00", "19:20"),
                    session("tuesday", "18:00", "20:00"),
                    session("tuesday", "19:00", "21:00"),
                ],
            }),
            ..Default::default()
        };
        let errs = draft.validate_step(WizardStep::Schedule).unwrap_err();
        assert!(errs.has_field("schedule.sessions[0].end_time"));
        assert!(errs.has_field("schedule.sessions[2]"));

        let empty = CommissionDraft { schedule: Some(ScheduleInput::default()), ..Default::default() };
        assert!(empty.validate_step(WizardStep::Schedule).unwrap_err().has_field("schedule.sessions"));
    }

    #[test]
    fn review_runs_the_calendar_cross_check() {
        let mut draft = complete_draft();
        // Tuesday and Wednesday only: no Monday or Thursday class.
        draft.dates = Some(DatesInput {
            start_date: "2026-03-03".into(),
            end_date: "2026-03-04".into(),
            enrollment_opens: "2026-02-01".into(),
            enrollment_closes: "2026-02-28".into(),
        });
        let errs = draft.validate_step(WizardStep::Review).unwrap_err();
        assert!(errs.has_field("schedule.sessions"), "{errs}");
        // The individual steps are still fine on their own.
        assert!(draft.validate_step(WizardStep::Dates).is_ok());
        assert!(draft.validate_step(WizardStep::Schedule).is_ok());
    }

    #[test]
    fn finish_reports_missing_steps() {
        let errs = CommissionDraft::default().finish().unwrap_err();
        assert!(errs.has_field("general"));
        assert!(errs.has_field("dates"));
        assert!(errs.has_field("schedule"));
        assert!(!errs.has_field("form"));
    }

    #[test]
    fn optional_ids_are_parsed() {
        let mut draft = complete_draft();
        let form_id = FormId::new();
        draft.form = Some(FormInput { form_id: Some(form_id.to_string()) });
        draft.general.as_mut().unwrap().teacher_id = Some(String::new());
        let new = draft.finish().unwrap();
        assert_eq!(new.form_id, Some(form_id));
        assert_eq!(new.teacher_id, None);

        draft.form = Some(FormInput { form_id: Some("x".into()) });
        assert!(draft.finish().unwrap_err().has_field("form.form_id"));
    }

    #[test]
    fn reschedule_validates_dates_and_sessions_together() {
        let input = RescheduleInput { dates: dates(), schedule: schedule() };
        let calendar = input.validate().unwrap();
        assert!(calendar.start_date < calendar.end_date);
        assert_eq!(calendar.sessions.len(), 2);

        // Monday to Wednesday has no Friday.
        let input = RescheduleInput {
            dates: DatesInput {
                start_date: "2026-03-02".into(),
                end_date: "2026-03-04".into(),
                ..dates()
            },
            schedule: ScheduleInput { sessions: vec![session("friday", "10:00", "12:00")] },
        };
        assert!(input.validate().unwrap_err().has_field("schedule.sessions"));
    }

    #[test]
    fn out_of_order_folds_into_domain_validation() {
        let err: DomainError = WizardError::NotReached(WizardStep::Review).into();
        match err {
            DomainError::Validation(errs) => assert!(errs.has_field("step")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
