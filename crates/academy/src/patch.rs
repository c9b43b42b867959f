//! Generic JSON merge for PATCH requests.
//!
//! The field policy has already vetted the keys; this only merges them into the
//! current record and lets serde enforce the types. Domain validation of the
//! merged record is the caller's next step.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use aula_core::{DomainError, DomainResult};

/// Merge the top-level keys of `patch` into `current`.
pub fn apply_patch<T>(current: &T, patch: &Value) -> DomainResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let patch = patch
        .as_object()
        .ok_or_else(|| DomainError::validation("body", "patch body must be a JSON object"))?;

    let mut merged = serde_json::to_value(current)
        .map_err(|e| DomainError::invariant(format!("record is not serializable: {e}")))?;

    let target = merged
        .as_object_mut()
        .ok_or_else(|| DomainError::invariant("record does not serialize to an object"))?;

    for (k, v) in patch {
        target.insert(k.clone(), v.clone());
    }

    serde_json::from_value(merged).map_err(|e| {
        // serde does not report the failing key; name it when unambiguous.
        let field = match (patch.len(), patch.keys().next()) {
            (1, Some(k)) => k.as_str(),
            _ => "body",
        };
        DomainError::validation(field, e.to_string())
    })
}
