use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use aula_core::Entity;

/// A storable record: an entity with a stable storage kind.
///
/// The body is stored as JSON, so the serde representation is the storage
/// format. Ids are UUIDv7, so ordering by id is ordering by creation time.
pub trait Record: Entity + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: &'static str;

    fn uuid(&self) -> Uuid {
        self.id().into()
    }
}

/// Storage operation error.
///
/// These are infrastructure errors; business rules live in the domain crates.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} already exists")]
    Conflict { kind: &'static str, id: Uuid },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Keyed CRUD storage for one record kind.
///
/// - `insert` fails with `Conflict` when the id already exists.
/// - `update` and `delete` fail with `NotFound` when it does not.
/// - `list` returns records in id (creation) order.
#[async_trait]
pub trait Repository<V: Record>: Send + Sync {
    async fn get(&self, id: V::Id) -> Result<Option<V>, StoreError>;

    async fn list(&self) -> Result<Vec<V>, StoreError>;

    async fn insert(&self, value: V) -> Result<V, StoreError>;

    async fn update(&self, value: V) -> Result<V, StoreError>;

    async fn delete(&self, id: V::Id) -> Result<(), StoreError>;
}

#[async_trait]
impl<V, R> Repository<V> for Arc<R>
where
    V: Record,
    R: Repository<V> + ?Sized,
{
    async fn get(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<V>, StoreError> {
        (**self).list().await
    }

    async fn insert(&self, value: V) -> Result<V, StoreError> {
        (**self).insert(value).await
    }

    async fn update(&self, value: V) -> Result<V, StoreError> {
        (**self).update(value).await
    }

    async fn delete(&self, id: V::Id) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}
