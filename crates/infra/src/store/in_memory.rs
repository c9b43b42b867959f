use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::r#trait::{Record, Repository, StoreError};

/// In-memory record store.
///
/// Intended for tests/dev and for running without a database.
#[derive(Debug)]
pub struct InMemoryRepository<V> {
    records: RwLock<BTreeMap<Uuid, V>>,
}

impl<V> Default for InMemoryRepository<V> {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<V> InMemoryRepository<V> {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl<V: Record> Repository<V> for InMemoryRepository<V> {
    async fn get(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(&id.into()).cloned())
    }

    async fn list(&self) -> Result<Vec<V>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.values().cloned().collect())
    }

    async fn insert(&self, value: V) -> Result<V, StoreError> {
        let id = value.uuid();
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records.contains_key(&id) {
            return Err(StoreError::Conflict { kind: V::KIND, id });
        }
        records.insert(id, value.clone());
        Ok(value)
    }

    async fn update(&self, value: V) -> Result<V, StoreError> {
        let id = value.uuid();
        let mut records = self.records.write().map_err(|_| poisoned())?;
        match records.get_mut(&id) {
            Some(slot) => {
                *slot = value.clone();
                Ok(value)
            }
            None => Err(StoreError::NotFound { kind: V::KIND, id }),
        }
    }

    async fn delete(&self, id: V::Id) -> Result<(), StoreError> {
        let id: Uuid = id.into();
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { kind: V::KIND, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_academy::{Course, NewCourse};
    use chrono::Utc;

    fn course(name: &str) -> Course {
        NewCourse {
            name: name.into(),
            description: String::new(),
            duration_weeks: 4,
            price_cents: 0,
        }
        .into_course(Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn insert_get_list_in_creation_order() {
        let repo = InMemoryRepository::<Course>::new();
        let a = repo.insert(course("A")).await.unwrap();
        // Distinct UUIDv7 timestamps.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let b = repo.insert(course("B")).await.unwrap();

        assert_eq!(repo.get(a.id).await.unwrap(), Some(a.clone()));
        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let repo = InMemoryRepository::<Course>::new();
        let a = repo.insert(course("A")).await.unwrap();
        let err = repo.insert(a).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { kind: "course", .. }));
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_records() {
        let repo = InMemoryRepository::<Course>::new();
        let ghost = course("ghost");
        assert!(matches!(repo.update(ghost.clone()).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(repo.delete(ghost.id).await, Err(StoreError::NotFound { .. })));

        let mut a = repo.insert(course("A")).await.unwrap();
        a.name = "A2".into();
        repo.update(a.clone()).await.unwrap();
        assert_eq!(repo.get(a.id).await.unwrap().map(|c| c.name), Some("A2".to_string()));

        repo.delete(a.id).await.unwrap();
        assert_eq!(repo.get(a.id).await.unwrap(), None);
    }
}
