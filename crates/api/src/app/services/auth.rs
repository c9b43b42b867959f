use chrono::{DateTime, Utc};
use tracing::instrument;

use aula_academy::{NewUser, User};
use aula_auth::Role;

use super::users::{password_matches, prepare_user};
use super::{now, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};

/// An issued bearer token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl AppServices {
    #[instrument(skip(self, password), err)]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let email = aula_academy::user::normalize_email(email);
        let user = match self.stores.users.list().await?.into_iter().find(|u| u.email == email) {
            Some(user) if password_matches(password, &user.password_hash).await? => Some(user),
            _ => None,
        };

        let Some(user) = user else {
            tracing::info!("login rejected: bad credentials");
            return Err(ServiceError::Unauthorized("invalid e-mail or password".to_string()));
        };
        if !user.can_log_in() {
            return Err(ServiceError::forbidden("account is suspended"));
        }

        tracing::info!(user_id = %user.id, "login");
        self.session_for(user)
    }

    /// Student self-registration. Any requested role is ignored.
    #[instrument(skip(self, input), err)]
    pub async fn register(&self, mut input: NewUser) -> ServiceResult<Session> {
        input.role = None;
        let user = prepare_user(input, Role::Student).await?;
        let user = {
            let _guard = self.users_lock.lock().await;
            let existing = self.stores.users.list().await?;
            self.insert_user(&existing, user).await?
        };
        tracing::info!(user_id = %user.id, "student registered");
        self.session_for(user)
    }

    fn session_for(&self, user: User) -> ServiceResult<Session> {
        let issued = now();
        let token = self.issuer.issue(user.id, user.role, issued)?;
        Ok(Session {
            token,
            expires_at: issued + self.issuer.ttl(),
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{admin, seed_user, services};
    use super::*;
    use aula_auth::JwtValidator;
    use serde_json::json;

    fn registration(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password: "correct horse".into(),
            first_name: "Alan".into(),
            last_name: "Turing".into(),
            document_number: None,
            phone: None,
            birth_date: None,
            role: Some(Role::Admin),
        }
    }

    #[tokio::test]
    async fn register_forces_student_and_issues_a_valid_token() {
        let services = services();
        let session = services.register(registration("alan@aula.test")).await.unwrap();
        assert_eq!(session.user.role, Role::Student);

        let claims = services.jwt_validator().validate(&session.token, Utc::now()).unwrap();
        assert_eq!(claims.sub, session.user.id);
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn login_checks_password_and_status() {
        let services = services();
        let user = seed_user(&services, "ada@aula.test", Role::Teacher).await;

        let session = services.login(" ADA@aula.test ", "correct horse").await.unwrap();
        assert_eq!(session.user.id, user.id);

        assert!(matches!(
            services.login("ada@aula.test", "wrong horse").await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            services.login("nobody@aula.test", "correct horse").await,
            Err(ServiceError::Unauthorized(_))
        ));

        services
            .update_user(&admin(), user.id, &json!({"status": "suspended"}))
            .await
            .unwrap();
        assert!(matches!(
            services.login("ada@aula.test", "correct horse").await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn password_hashing_does_not_hold_the_user_lock() {
        let services = services();
        let _writer = services.users_lock.lock().await;

        let user = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            prepare_user(registration("grace@aula.test"), Role::Student),
        )
        .await
        .expect("hashing waited for users_lock")
        .unwrap();
        assert!(password_matches("correct horse", &user.password_hash).await.unwrap());
        assert!(!password_matches("wrong horse", &user.password_hash).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_registrations_keep_emails_unique() {
        let services = std::sync::Arc::new(services());
        let emails = ["a@aula.test", "b@aula.test", "c@aula.test", "a@aula.test", "A@aula.test"];

        let handles: Vec<_> = emails
            .iter()
            .map(|email| {
                let services = services.clone();
                let input = registration(email);
                tokio::spawn(async move { services.register(input).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(ServiceError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((created, conflicts), (3, 2));
        assert_eq!(services.stores.users.list().await.unwrap().len(), 3);
    }
}
