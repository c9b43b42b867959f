//! Record storage boundary.
//!
//! Services talk to [`Repository`] trait objects; the process picks the
//! backend once at startup (in-memory or Postgres) and hands out [`Stores`].

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

use std::sync::Arc;

use aula_academy::{Commission, Course, Enrollment, Form, Payment, Response, User};

pub use in_memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use r#trait::{Record, Repository, StoreError};

impl Record for User {
    const KIND: &'static str = "user";
}

impl Record for Course {
    const KIND: &'static str = "course";
}

impl Record for Commission {
    const KIND: &'static str = "commission";
}

impl Record for Enrollment {
    const KIND: &'static str = "enrollment";
}

impl Record for Payment {
    const KIND: &'static str = "payment";
}

impl Record for Form {
    const KIND: &'static str = "form";
}

impl Record for Response {
    const KIND: &'static str = "response";
}

/// One repository per record kind.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn Repository<User>>,
    pub courses: Arc<dyn Repository<Course>>,
    pub commissions: Arc<dyn Repository<Commission>>,
    pub enrollments: Arc<dyn Repository<Enrollment>>,
    pub payments: Arc<dyn Repository<Payment>>,
    pub forms: Arc<dyn Repository<Form>>,
    pub responses: Arc<dyn Repository<Response>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::new()),
            courses: Arc::new(InMemoryRepository::new()),
            commissions: Arc::new(InMemoryRepository::new()),
            enrollments: Arc::new(InMemoryRepository::new()),
            payments: Arc::new(InMemoryRepository::new()),
            forms: Arc::new(InMemoryRepository::new()),
            responses: Arc::new(InMemoryRepository::new()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PostgresRepository::new(pool.clone())),
            courses: Arc::new(PostgresRepository::new(pool.clone())),
            commissions: Arc::new(PostgresRepository::new(pool.clone())),
            enrollments: Arc::new(PostgresRepository::new(pool.clone())),
            payments: Arc::new(PostgresRepository::new(pool.clone())),
            forms: Arc::new(PostgresRepository::new(pool.clone())),
            responses: Arc::new(PostgresRepository::new(pool)),
        }
    }
}
