use axum::{routing::get, Router};

pub mod auth;
pub mod commissions;
pub mod courses;
pub mod enrollments;
pub mod forms;
pub mod me;
pub mod payments;
pub mod rbac;
pub mod responses;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/navigation", get(me::navigation))
        .nest("/me", me::router())
        .nest("/users", users::router())
        .nest("/courses", courses::router())
        .nest("/commissions", commissions::router())
        .nest("/forms", forms::router())
        .nest("/responses", responses::router())
        .nest("/enrollments", enrollments::router())
        .nest("/payments", payments::router())
        .nest("/rbac", rbac::router())
}
