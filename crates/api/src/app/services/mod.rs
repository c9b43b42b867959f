//! Application services: authorization, row ownership and cross-record rules
//! on top of the domain crates and the record stores.
//!
//! Every operation takes the caller's [`Principal`] and authorizes inside, so
//! handlers stay thin and the rules are testable without HTTP.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::instrument;

use aula_academy::User;
use aula_auth::{Hs256JwtIssuer, Hs256JwtValidator, JwtValidator, Role};
use aula_infra::store::postgres;
use aula_infra::{AdminBootstrap, AppConfig, Record, Repository, Stores};

use crate::app::errors::{ServiceError, ServiceResult};

mod auth;
mod commissions;
mod courses;
mod enrollments;
mod forms;
mod payments;
mod responses;
mod users;

pub use auth::Session;
pub use enrollments::Preinscription;

/// Shared state behind every protected route.
pub struct AppServices {
    stores: Stores,
    issuer: Hs256JwtIssuer,
    validator: Arc<Hs256JwtValidator>,
    /// Serializes e-mail uniqueness checks with the insert/update that follows.
    users_lock: Mutex<()>,
    /// Serializes seat allocation with commission writes that change capacity,
    /// form, calendar or existence.
    enrollments_lock: Mutex<()>,
}

impl AppServices {
    pub fn new(stores: Stores, jwt_secret: &str, token_ttl: chrono::Duration) -> Self {
        Self {
            stores,
            issuer: Hs256JwtIssuer::new(jwt_secret.as_bytes().to_vec(), token_ttl),
            validator: Arc::new(Hs256JwtValidator::new(jwt_secret.as_bytes().to_vec())),
            users_lock: Mutex::new(()),
            enrollments_lock: Mutex::new(()),
        }
    }

    /// In-memory services with the default token lifetime.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(
            Stores::in_memory(),
            jwt_secret,
            chrono::Duration::minutes(aula_infra::config::DEFAULT_TOKEN_TTL_MINUTES),
        )
    }

    pub fn jwt_validator(&self) -> Arc<dyn JwtValidator> {
        self.validator.clone()
    }

    /// Create the configured administrator unless an admin already exists.
    #[instrument(skip(self, admin), fields(email = %admin.email), err)]
    pub async fn bootstrap_admin(&self, admin: &AdminBootstrap) -> ServiceResult<Option<User>> {
        if self.has_admin().await? {
            tracing::debug!("an administrator already exists; skipping bootstrap");
            return Ok(None);
        }

        let input = aula_academy::NewUser {
            email: admin.email.clone(),
            password: admin.password.clone(),
            first_name: "Admin".to_string(),
            last_name: "Aula".to_string(),
            document_number: None,
            phone: None,
            birth_date: None,
            role: Some(Role::Admin),
        };
        let user = users::prepare_user(input, Role::Admin).await?;

        let _guard = self.users_lock.lock().await;
        let existing = self.stores.users.list().await?;
        if existing.iter().any(|u| u.role == Role::Admin) {
            return Ok(None);
        }
        let user = self.insert_user(&existing, user).await?;
        tracing::info!(user_id = %user.id, "bootstrap administrator created");
        Ok(Some(user))
    }

    async fn has_admin(&self) -> ServiceResult<bool> {
        let users = self.stores.users.list().await?;
        Ok(users.iter().any(|u| u.role == Role::Admin))
    }
}

/// Wire services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory storage otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let stores = match &config.database_url {
        Some(url) => {
            let pool = postgres::connect(url).await?;
            tracing::info!("using postgres record store");
            Stores::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; records are kept in memory");
            Stores::in_memory()
        }
    };

    let services = AppServices::new(stores, &config.jwt_secret, config.token_ttl);
    if let Some(admin) = &config.admin {
        services.bootstrap_admin(admin).await?;
    }
    Ok(services)
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Load a record or fail with 404 naming `what`.
pub(crate) async fn require<V: Record>(
    repo: &dyn Repository<V>,
    id: V::Id,
    what: &str,
) -> ServiceResult<V> {
    repo.get(id).await?.ok_or_else(|| ServiceError::not_found(what))
}
