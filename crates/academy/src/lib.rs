//! Academy domain module: users, courses, commissions, intake forms,
//! enrollments and payments.
//!
//! This crate holds the business rules as deterministic domain logic (no IO,
//! no HTTP, no storage). Records are plain data; creation goes through
//! validated constructors and updates through [`patch::apply_patch`] followed by
//! the record's own `validate`.

pub mod commission;
pub mod course;
pub mod enrollment;
pub mod form;
pub mod patch;
pub mod payment;
pub mod response;
pub mod schedule;
pub mod user;
pub mod wizard;

pub use commission::{Commission, CommissionStatus, Modality, NewCommission};
pub use course::{Course, CourseStatus, NewCourse};
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use form::{Form, FormStage, NewForm, NewQuestion, NewStage, Question, QuestionKind, QuestionOption};
pub use payment::{NewPayment, Payment, PaymentMethod, PaymentStatus};
pub use response::{validate_answers, validate_stage, Answers, Response};
pub use schedule::{Session, Weekday};
pub use user::{NewUser, User, UserStatus};
pub use wizard::{
    Calendar, CommissionDraft, CommissionWizard, DatesInput, FormInput, GeneralInput, RescheduleInput,
    ScheduleInput, SessionInput, StepInput, WizardError, WizardStep,
};
