use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use aula_auth::Role;
use aula_core::{Entity, UserId, ValidationErrors};

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User is active and can log in.
    #[default]
    Active,
    /// User is suspended and cannot log in.
    Suspended,
}

/// Persisted user record.
///
/// `password_hash` is part of the stored body but never part of any field
/// policy, so it is stripped from every API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub document_number: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Input for creating a user (admin creation or student self-registration).
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl NewUser {
    /// Validate everything but the password, which the hashing layer checks.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_profile(
            &mut errors,
            &self.email,
            &self.first_name,
            &self.last_name,
            self.birth_date,
            today,
        );
        errors.into_result()
    }

    /// Build the record. `password_hash` must already be computed.
    pub fn into_user(self, password_hash: String, default_role: Role, now: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            email: normalize_email(&self.email),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            document_number: non_blank(self.document_number),
            phone: non_blank(self.phone),
            birth_date: self.birth_date,
            role: self.role.unwrap_or(default_role),
            status: UserStatus::Active,
            password_hash,
            created_at: now,
        }
    }
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn can_log_in(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Validate a (possibly patched) record.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_profile(
            &mut errors,
            &self.email,
            &self.first_name,
            &self.last_name,
            self.birth_date,
            today,
        );
        errors.into_result()
    }

    /// Normalize user-editable text after a patch.
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.document_number = non_blank(self.document_number);
        self.phone = non_blank(self.phone);
        self
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn check_profile(
    errors: &mut ValidationErrors,
    email: &str,
    first_name: &str,
    last_name: &str,
    birth_date: Option<NaiveDate>,
    today: NaiveDate,
) {
    errors.check(is_valid_email(email), "email", "must be a valid email address");
    errors.check(!first_name.trim().is_empty(), "first_name", "cannot be empty");
    errors.check(!last_name.trim().is_empty(), "last_name", "cannot be empty");
    if let Some(born) = birth_date {
        errors.check(born < today, "birth_date", "must be in the past");
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "secret-password".to_string(),
            first_name: " Ana ".to_string(),
            last_name: "Pérez".to_string(),
            document_number: Some("  ".to_string()),
            phone: None,
            birth_date: None,
            role: None,
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("a@b@c"));
        assert!(!is_valid_email("a na@b.c"));
    }

    #[test]
    fn new_user_is_normalized_and_defaults_role() {
        let input = new_user(" Ana@Example.COM ");
        assert!(input.validate(today()).is_ok());
        let user = input.into_user("hash".into(), Role::Student, Utc::now());
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.first_name, "Ana");
        assert_eq!(user.document_number, None);
        assert_eq!(user.role, Role::Student);
        assert!(user.can_log_in());
    }

    #[test]
    fn future_birth_date_and_blank_names_are_rejected() {
        let mut input = new_user("ana@example.com");
        input.first_name = "  ".into();
        input.birth_date = NaiveDate::from_ymd_opt(2030, 1, 1);
        let errs = input.validate(today()).unwrap_err();
        assert!(errs.has_field("first_name"));
        assert!(errs.has_field("birth_date"));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserStatus::Suspended).unwrap(), "\"suspended\"");
    }
}
