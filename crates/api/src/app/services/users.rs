use serde_json::Value;
use tracing::instrument;

use aula_academy::patch::apply_patch;
use aula_academy::{NewUser, User, UserStatus};
use aula_auth::fields::check_patch;
use aula_auth::permissions::{USERS_READ, USERS_WRITE};
use aula_auth::{authorize, hash_password, verify_password, Model, Principal, Role};
use aula_core::UserId;

use super::{now, require, today, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};

/// Validate a new user and hash its password. Runs before `users_lock` is
/// taken so concurrent writes do not queue behind argon2.
pub(crate) async fn prepare_user(input: NewUser, default_role: Role) -> ServiceResult<User> {
    input.validate(today())?;
    let password = input.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("password hashing task failed: {e}")))??;
    Ok(input.into_user(hash, default_role, now()))
}

/// Check a password off the async workers.
pub(crate) async fn password_matches(password: &str, hash: &str) -> ServiceResult<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("password check task failed: {e}")))
}

fn is_active_admin(user: &User) -> bool {
    user.role == Role::Admin && user.status == UserStatus::Active
}

impl AppServices {
    /// Store a prepared user, enforcing e-mail uniqueness. Callers hold
    /// `users_lock` and pass the current user list.
    pub(crate) async fn insert_user(&self, existing: &[User], user: User) -> ServiceResult<User> {
        if existing.iter().any(|u| u.email == user.email) {
            return Err(ServiceError::conflict(format!("e-mail {} is already registered", user.email)));
        }
        Ok(self.stores.users.insert(user).await?)
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn list_users(&self, principal: &Principal) -> ServiceResult<Vec<User>> {
        authorize(principal, &USERS_READ)?;
        Ok(self.stores.users.list().await?)
    }

    /// Anyone may read their own record; other users need `users.read`.
    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn get_user(&self, principal: &Principal, id: UserId) -> ServiceResult<User> {
        if id != principal.user_id {
            authorize(principal, &USERS_READ)?;
        }
        require(&*self.stores.users, id, "user").await
    }

    #[instrument(skip(self, principal, input), fields(caller = %principal.user_id), err)]
    pub async fn create_user(&self, principal: &Principal, input: NewUser) -> ServiceResult<User> {
        authorize(principal, &USERS_WRITE)?;
        let user = prepare_user(input, Role::Student).await?;

        let _guard = self.users_lock.lock().await;
        let existing = self.stores.users.list().await?;
        let user = self.insert_user(&existing, user).await?;
        tracing::info!(user_id = %user.id, role = %user.role.as_str(), "user created");
        Ok(user)
    }

    /// Patch a user. Editing yourself needs no permission beyond the field
    /// policy of your role; editing others needs `users.write`.
    #[instrument(skip(self, principal, patch), fields(caller = %principal.user_id), err)]
    pub async fn update_user(&self, principal: &Principal, id: UserId, patch: &Value) -> ServiceResult<User> {
        if id != principal.user_id {
            authorize(principal, &USERS_WRITE)?;
        }
        check_patch(principal.role, Model::User, patch)?;

        let _guard = self.users_lock.lock().await;
        let current = require(&*self.stores.users, id, "user").await?;
        let updated = apply_patch(&current, patch)?.normalized();
        updated.validate(today())?;

        let users = self.stores.users.list().await?;
        if updated.email != current.email && users.iter().any(|u| u.id != id && u.email == updated.email) {
            return Err(ServiceError::conflict(format!(
                "e-mail {} is already registered",
                updated.email
            )));
        }
        if is_active_admin(&current) && !is_active_admin(&updated) {
            let others = users.iter().filter(|u| u.id != id && is_active_admin(u)).count();
            if others == 0 {
                return Err(ServiceError::conflict("at least one active administrator must remain"));
            }
        }

        Ok(self.stores.users.update(updated).await?)
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn delete_user(&self, principal: &Principal, id: UserId) -> ServiceResult<()> {
        authorize(principal, &USERS_WRITE)?;
        if id == principal.user_id {
            return Err(ServiceError::conflict("you cannot delete your own account"));
        }

        let _guard = self.users_lock.lock().await;
        require(&*self.stores.users, id, "user").await?;
        let enrolled = self.stores.enrollments.list().await?.iter().any(|e| e.user_id == id);
        if enrolled {
            return Err(ServiceError::conflict("user has enrollments"));
        }
        let teaches = self
            .stores
            .commissions
            .list()
            .await?
            .iter()
            .any(|c| c.teacher_id == Some(id));
        if teaches {
            return Err(ServiceError::conflict("user is assigned to commissions"));
        }

        self.stores.users.delete(id).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}
