//! Attribute-level permission filter.
//!
//! A static Role × Model table decides, for every model the API exposes:
//! - which fields a role may **see** (a view allow-list), and
//! - which fields a role may **edit**, optionally restricted to a whitelist of
//!   values (e.g. a student may set `enrollment.status`, but only to `cancelled`).
//!
//! The table is applied uniformly: every read goes through [`filter_view`] and
//! every PATCH body through [`check_patch`]. Row ownership ("a student only sees
//! their own enrollments") is not expressed here; services enforce it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Role;

/// Models covered by the field policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    User,
    Course,
    Commission,
    Enrollment,
    Payment,
    Form,
    Response,
}

impl Model {
    pub const ALL: [Model; 7] = [
        Model::User,
        Model::Course,
        Model::Commission,
        Model::Enrollment,
        Model::Payment,
        Model::Form,
        Model::Response,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::User => "user",
            Model::Course => "course",
            Model::Commission => "commission",
            Model::Enrollment => "enrollment",
            Model::Payment => "payment",
            Model::Form => "form",
            Model::Response => "response",
        }
    }

    /// Every field the model exposes to clients.
    ///
    /// Storage-only attributes (the user's password hash) are absent, so no
    /// role can ever see them.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Model::User => USER_FIELDS,
            Model::Course => COURSE_FIELDS,
            Model::Commission => COMMISSION_FIELDS,
            Model::Enrollment => ENROLLMENT_FIELDS,
            Model::Payment => PAYMENT_FIELDS,
            Model::Form => FORM_FIELDS,
            Model::Response => RESPONSE_FIELDS,
        }
    }
}

impl core::fmt::Display for Model {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

const USER_FIELDS: &[&str] = &[
    "id",
    "email",
    "first_name",
    "last_name",
    "document_number",
    "phone",
    "birth_date",
    "role",
    "status",
    "created_at",
];

const COURSE_FIELDS: &[&str] = &[
    "id",
    "name",
    "description",
    "duration_weeks",
    "price_cents",
    "status",
    "created_at",
];

const COMMISSION_FIELDS: &[&str] = &[
    "id",
    "course_id",
    "name",
    "teacher_id",
    "modality",
    "status",
    "capacity",
    "start_date",
    "end_date",
    "enrollment_opens",
    "enrollment_closes",
    "sessions",
    "weekly_minutes",
    "class_count",
    "total_minutes",
    "form_id",
    "notes",
    "created_at",
];

const ENROLLMENT_FIELDS: &[&str] = &[
    "id",
    "user_id",
    "commission_id",
    "response_id",
    "status",
    "grade",
    "notes",
    "created_at",
];

const PAYMENT_FIELDS: &[&str] = &[
    "id",
    "enrollment_id",
    "user_id",
    "amount_cents",
    "currency",
    "method",
    "status",
    "reference",
    "paid_at",
    "created_at",
];

const FORM_FIELDS: &[&str] = &["id", "title", "description", "stages", "created_at"];

const RESPONSE_FIELDS: &[&str] = &[
    "id",
    "form_id",
    "commission_id",
    "user_id",
    "answers",
    "submitted_at",
];

// Enumerated values accepted through PATCH. They mirror the serde names of the
// academy enums.
pub const USER_ROLES: &[&str] = &["admin", "teacher", "student"];
pub const USER_STATUSES: &[&str] = &["active", "suspended"];
pub const COURSE_STATUSES: &[&str] = &["draft", "published", "archived"];
pub const COMMISSION_STATUSES: &[&str] = &["draft", "open", "closed", "finished"];
pub const MODALITIES: &[&str] = &["in_person", "online", "hybrid"];
pub const ENROLLMENT_STATUSES: &[&str] = &["pre_enrolled", "enrolled", "cancelled", "approved", "failed"];
pub const PAYMENT_STATUSES: &[&str] = &["pending", "approved", "rejected", "refunded"];

/// One editable field, optionally restricted to a set of string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<&'static [&'static str]>,
}

// Struct literals (not const fn calls) so the rule arrays below are promoted
// to `'static`.
macro_rules! free {
    ($field:literal) => {
        FieldRule {
            field: $field,
            allowed: None,
        }
    };
}

macro_rules! one_of {
    ($field:literal, $allowed:expr) => {
        FieldRule {
            field: $field,
            allowed: Some($allowed),
        }
    };
}

const GRADING_OUTCOMES: &[&str] = &["approved", "failed"];
const SELF_CANCEL: &[&str] = &["cancelled"];

#[derive(Debug, Clone, Copy)]
enum View {
    All,
    Only(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
struct ModelPolicy {
    view: View,
    edit: &'static [FieldRule],
}

const fn policy_of(view: View, edit: &'static [FieldRule]) -> ModelPolicy {
    ModelPolicy { view, edit }
}

const NONE: &[FieldRule] = &[];

fn policy(role: Role, model: Model) -> ModelPolicy {
    use Model as M;
    use Role as R;

    match (role, model) {
        // ── admin ───────────────────────────────────────────────────────────
        (R::Admin, M::User) => policy_of(
            View::All,
            &[
                free!("email"),
                free!("first_name"),
                free!("last_name"),
                free!("document_number"),
                free!("phone"),
                free!("birth_date"),
                one_of!("role", USER_ROLES),
                one_of!("status", USER_STATUSES),
            ],
        ),
        (R::Admin, M::Course) => policy_of(
            View::All,
            &[
                free!("name"),
                free!("description"),
                free!("duration_weeks"),
                free!("price_cents"),
                one_of!("status", COURSE_STATUSES),
            ],
        ),
        (R::Admin, M::Commission) => policy_of(
            View::All,
            &[
                free!("name"),
                free!("teacher_id"),
                one_of!("modality", MODALITIES),
                one_of!("status", COMMISSION_STATUSES),
                free!("capacity"),
                free!("form_id"),
                free!("notes"),
            ],
        ),
        (R::Admin, M::Enrollment) => policy_of(
            View::All,
            &[one_of!("status", ENROLLMENT_STATUSES), free!("grade"), free!("notes")],
        ),
        (R::Admin, M::Payment) => {
            policy_of(View::All, &[one_of!("status", PAYMENT_STATUSES), free!("reference")])
        }
        (R::Admin, M::Form) => policy_of(View::All, &[free!("title"), free!("description")]),
        (R::Admin, M::Response) => policy_of(View::All, NONE),

        // ── teacher ─────────────────────────────────────────────────────────
        (R::Teacher, M::User) => policy_of(
            View::Only(&["id", "email", "first_name", "last_name", "phone", "role"]),
            &[free!("first_name"), free!("last_name"), free!("phone")],
        ),
        (R::Teacher, M::Course) => policy_of(View::All, &[free!("description")]),
        (R::Teacher, M::Commission) => policy_of(View::All, &[free!("notes")]),
        (R::Teacher, M::Enrollment) => policy_of(
            View::All,
            &[one_of!("status", GRADING_OUTCOMES), free!("grade"), free!("notes")],
        ),
        (R::Teacher, M::Payment) => policy_of(View::Only(&["id", "enrollment_id", "status"]), NONE),
        (R::Teacher, M::Form) => policy_of(View::All, NONE),
        (R::Teacher, M::Response) => policy_of(View::All, NONE),

        // ── student ─────────────────────────────────────────────────────────
        (R::Student, M::User) => policy_of(
            View::Only(&[
                "id",
                "email",
                "first_name",
                "last_name",
                "document_number",
                "phone",
                "birth_date",
                "role",
                "created_at",
            ]),
            &[free!("first_name"), free!("last_name"), free!("phone"), free!("birth_date")],
        ),
        (R::Student, M::Course) => policy_of(
            View::Only(&["id", "name", "description", "duration_weeks", "price_cents"]),
            NONE,
        ),
        (R::Student, M::Commission) => policy_of(
            View::Only(&[
                "id",
                "course_id",
                "name",
                "teacher_id",
                "modality",
                "status",
                "capacity",
                "start_date",
                "end_date",
                "enrollment_opens",
                "enrollment_closes",
                "sessions",
                "weekly_minutes",
                "class_count",
                "total_minutes",
                "form_id",
            ]),
            NONE,
        ),
        (R::Student, M::Enrollment) => policy_of(
            View::Only(&["id", "commission_id", "response_id", "status", "grade", "created_at"]),
            &[one_of!("status", SELF_CANCEL)],
        ),
        (R::Student, M::Payment) => policy_of(
            View::Only(&[
                "id",
                "enrollment_id",
                "amount_cents",
                "currency",
                "method",
                "status",
                "reference",
                "paid_at",
                "created_at",
            ]),
            NONE,
        ),
        (R::Student, M::Form) => policy_of(View::Only(&["id", "title", "description", "stages"]), NONE),
        (R::Student, M::Response) => policy_of(
            View::Only(&["id", "form_id", "commission_id", "answers", "submitted_at"]),
            NONE,
        ),
    }
}

/// Fields `role` may see on `model`, in model declaration order.
pub fn viewable_fields(role: Role, model: Model) -> Vec<&'static str> {
    match policy(role, model).view {
        View::All => model.fields().to_vec(),
        View::Only(allowed) => model
            .fields()
            .iter()
            .copied()
            .filter(|f| allowed.contains(f))
            .collect(),
    }
}

pub fn can_view(role: Role, model: Model, field: &str) -> bool {
    match policy(role, model).view {
        View::All => model.fields().contains(&field),
        View::Only(allowed) => allowed.contains(&field) && model.fields().contains(&field),
    }
}

/// Edit rules for `role` on `model`.
pub fn editable_fields(role: Role, model: Model) -> &'static [FieldRule] {
    policy(role, model).edit
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldPolicyError {
    #[error("patch body must be a JSON object")]
    NotAnObject,

    #[error("field '{field}' of {model} is not editable by role {role}")]
    FieldNotEditable {
        role: Role,
        model: Model,
        field: String,
    },

    #[error("value {value} is not allowed for field '{field}' (allowed: {})", .allowed.join(", "))]
    ValueNotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl FieldPolicyError {
    /// Name of the offending field, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            FieldPolicyError::NotAnObject => None,
            FieldPolicyError::FieldNotEditable { field, .. } => Some(field),
            FieldPolicyError::ValueNotAllowed { field, .. } => Some(field),
        }
    }
}

/// Check a single field assignment.
pub fn check_edit(role: Role, model: Model, field: &str, value: &Value) -> Result<(), FieldPolicyError> {
    let rule = editable_fields(role, model)
        .iter()
        .find(|r| r.field == field)
        .ok_or_else(|| FieldPolicyError::FieldNotEditable {
            role,
            model,
            field: field.to_string(),
        })?;

    if let Some(allowed) = rule.allowed {
        let accepted = value.as_str().is_some_and(|v| allowed.contains(&v));
        if !accepted {
            return Err(FieldPolicyError::ValueNotAllowed {
                field: field.to_string(),
                value: value.to_string(),
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    Ok(())
}

/// Check every key of a PATCH body against the edit policy.
///
/// Keys are checked in the order `serde_json` iterates them (sorted), so the
/// reported field is deterministic.
pub fn check_patch(role: Role, model: Model, patch: &Value) -> Result<(), FieldPolicyError> {
    let obj = patch.as_object().ok_or(FieldPolicyError::NotAnObject)?;
    for (field, value) in obj {
        check_edit(role, model, field, value)?;
    }
    Ok(())
}

/// Strip every field `role` may not see.
///
/// Objects keep only viewable keys; arrays are filtered element-wise; any other
/// JSON value passes through unchanged.
pub fn filter_view(role: Role, model: Model, value: Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(filter_object(role, model, obj)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| filter_view(role, model, item))
                .collect(),
        ),
        other => other,
    }
}

fn filter_object(role: Role, model: Model, obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter()
        .filter(|(k, _)| can_view(role, model, k))
        .collect()
}

/// Serializable policy of one model for one role (consumed by the admin UI to
/// decide which columns and inputs to render).
#[derive(Debug, Clone, Serialize)]
pub struct ModelPolicySummary {
    pub model: Model,
    pub view: Vec<&'static str>,
    pub edit: Vec<FieldRule>,
}

pub fn summary(role: Role) -> Vec<ModelPolicySummary> {
    Model::ALL
        .iter()
        .map(|model| ModelPolicySummary {
            model: *model,
            view: viewable_fields(role, *model),
            edit: editable_fields(role, *model).to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn admin_sees_every_exposed_field_but_never_the_password_hash() {
        let user = json!({
            "id": "u1",
            "email": "a@b.c",
            "first_name": "Ana",
            "role": "admin",
            "password_hash": "$argon2id$...",
        });
        let filtered = filter_view(Role::Admin, Model::User, user);
        assert_eq!(filtered["email"], "a@b.c");
        assert!(filtered.get("password_hash").is_none());
    }

    #[test]
    fn teacher_sees_reduced_payment() {
        let payment = json!({
            "id": "p1",
            "enrollment_id": "e1",
            "amount_cents": 1000,
            "status": "pending",
            "reference": "tx-1",
        });
        let filtered = filter_view(Role::Teacher, Model::Payment, payment);
        assert_eq!(filtered, json!({"id": "p1", "enrollment_id": "e1", "status": "pending"}));
    }

    #[test]
    fn arrays_are_filtered_element_wise() {
        let list = json!([{"id": "e1", "notes": "late"}, {"id": "e2", "notes": null}]);
        let filtered = filter_view(Role::Student, Model::Enrollment, list);
        assert_eq!(filtered, json!([{"id": "e1"}, {"id": "e2"}]));
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(filter_view(Role::Student, Model::Course, json!(3)), json!(3));
    }

    #[test]
    fn student_may_only_cancel_enrollment() {
        assert_eq!(
            check_patch(Role::Student, Model::Enrollment, &json!({"status": "cancelled"})),
            Ok(())
        );

        let err = check_patch(Role::Student, Model::Enrollment, &json!({"status": "approved"})).unwrap_err();
        assert!(matches!(err, FieldPolicyError::ValueNotAllowed { ref field, .. } if field == "status"));

        let err = check_patch(Role::Student, Model::Enrollment, &json!({"grade": 10})).unwrap_err();
        assert_eq!(err.field(), Some("grade"));
    }

    #[test]
    fn whitelisted_fields_reject_non_string_values() {
        let err = check_patch(Role::Admin, Model::User, &json!({"role": null})).unwrap_err();
        assert!(matches!(err, FieldPolicyError::ValueNotAllowed { .. }));
    }

    #[test]
    fn teacher_grades_but_cannot_enroll() {
        assert!(check_patch(Role::Teacher, Model::Enrollment, &json!({"status": "failed", "grade": 4})).is_ok());
        assert!(check_patch(Role::Teacher, Model::Enrollment, &json!({"status": "enrolled"})).is_err());
    }

    #[test]
    fn admin_role_assignment_is_whitelisted() {
        assert!(check_patch(Role::Admin, Model::User, &json!({"role": "teacher"})).is_ok());
        assert!(check_patch(Role::Admin, Model::User, &json!({"role": "root"})).is_err());
        assert!(check_patch(Role::Admin, Model::User, &json!({"password_hash": "x"})).is_err());
    }

    #[test]
    fn non_object_patch_is_rejected() {
        assert_eq!(
            check_patch(Role::Admin, Model::Course, &json!(["name"])),
            Err(FieldPolicyError::NotAnObject)
        );
    }

    #[test]
    fn error_reports_first_field_in_sorted_order() {
        let err = check_patch(Role::Student, Model::User, &json!({"role": "admin", "email": "x@y.z"})).unwrap_err();
        assert_eq!(err.field(), Some("email"));
    }

    #[test]
    fn editable_fields_are_always_viewable() {
        for role in Role::ALL {
            for model in Model::ALL {
                for rule in editable_fields(role, model) {
                    assert!(
                        can_view(role, model, rule.field),
                        "{role} can edit {model}.{} without seeing it",
                        rule.field
                    );
                }
            }
        }
    }

    #[test]
    fn summary_covers_every_model() {
        let s = summary(Role::Teacher);
        assert_eq!(s.len(), Model::ALL.len());
        let payment = s.iter().find(|m| m.model == Model::Payment).unwrap();
        assert_eq!(payment.view, vec!["id", "enrollment_id", "status"]);
        assert!(payment.edit.is_empty());
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn model_strategy() -> impl Strategy<Value = Model> {
        prop::sample::select(Model::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn filtered_keys_are_a_viewable_subset(
            role in role_strategy(),
            model in model_strategy(),
            keys in prop::collection::vec("[a-z_]{1,16}", 0..12),
        ) {
            let mut obj = Map::new();
            for (i, k) in keys.iter().enumerate() {
                obj.insert(k.clone(), json!(i));
            }
            // Also include every real field so the filter has something to keep.
            for f in model.fields() {
                obj.insert((*f).to_string(), json!(f));
            }

            let filtered = filter_view(role, model, Value::Object(obj));
            let filtered = filtered.as_object().unwrap();
            let viewable = viewable_fields(role, model);

            prop_assert_eq!(filtered.len(), viewable.len());
            for k in filtered.keys() {
                prop_assert!(viewable.contains(&k.as_str()));
            }
        }

        #[test]
        fn filter_is_idempotent(role in role_strategy(), model in model_strategy()) {
            let mut obj = Map::new();
            for f in model.fields() {
                obj.insert((*f).to_string(), json!(f));
            }
            obj.insert("password_hash".to_string(), json!("secret"));
            let once = filter_view(role, model, Value::Object(obj));
            let twice = filter_view(role, model, once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
