//! `aula-core` - domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the entity contract and the error types every layer shares.

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    CommissionId, CourseId, EnrollmentId, FormId, OptionId, PaymentId, QuestionId, ResponseId,
    UserId,
};
pub use validation::{FieldError, ValidationErrors};
