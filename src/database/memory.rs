use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::DocumentStore;
use crate::models::{bson_to_json, Collection, DeleteAck, InsertAck, UpdateAck};
use crate::utils::StoreError;

/// In-process store with the same equality-filter semantics as the driver.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(actual) => actual == expected,
        None => *expected == Bson::Null,
    })
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Collection, Vec<Document>>> {
        self.collections.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Collection, Vec<Document>>> {
        self.collections.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.read().get(&collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.read();
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| matches(d, &filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.read();
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, &filter)).cloned()))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertAck, StoreError> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let mut collections = self.write();
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(StoreError::Database(format!("duplicate key: {}", id)));
        }
        docs.push(document);

        Ok(InsertAck {
            acknowledged: true,
            inserted_id: bson_to_json(id),
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        changes: Document,
        upsert: bool,
    ) -> Result<UpdateAck, StoreError> {
        let mut collections = self.write();
        let docs = collections.entry(collection).or_default();

        if let Some(existing) = docs.iter_mut().find(|d| matches(d, &filter)) {
            let mut modified = false;
            for (key, value) in changes {
                if key == "_id" && existing.get("_id") != Some(&value) {
                    return Err(StoreError::Database(
                        "the (immutable) field '_id' was found to have been altered".to_string(),
                    ));
                }
                if existing.get(&key) != Some(&value) {
                    existing.insert(key, value);
                    modified = true;
                }
            }
            // An empty `$set` still matches, as on MongoDB 5.0+.
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_count: 0,
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_count: 0,
                upserted_id: None,
            });
        }

        let mut created = filter;
        created.extend(changes);
        let id = created
            .get("_id")
            .cloned()
            .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
        created.insert("_id", id.clone());
        docs.push(created);

        Ok(UpdateAck {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(bson_to_json(id)),
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<DeleteAck, StoreError> {
        let mut collections = self.write();
        let docs = collections.entry(collection).or_default();

        let deleted_count = match docs.iter().position(|d| matches(d, &filter)) {
            Some(index) => {
                docs.remove(index);
                1
            }
            None => 0,
        };

        Ok(DeleteAck {
            acknowledged: true,
            deleted_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn upsert_creates_then_updates_in_place() {
        let store = MemoryStore::new();

        let filter = doc! { "email": "a@clinic.io" };

        let ack = store
            .update_one(Collection::Users, filter.clone(), doc! { "roles": "student" }, true)
            .await
            .unwrap();
        assert_eq!(ack.upserted_count, 1);

        let ack = store
            .update_one(Collection::Users, filter, doc! { "roles": "admin" }, true)
            .await
            .unwrap();
        assert_eq!((ack.matched_count, ack.modified_count, ack.upserted_count), (1, 1, 0));

        let users = store.find(Collection::Users, doc! {}).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].get_str("roles").unwrap(), "admin");
        assert_eq!(users[0].get_str("email").unwrap(), "a@clinic.io");
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Doctors, doc! { "email": "x@y.z" })
            .await
            .unwrap();

        assert_eq!(store.count(Collection::Doctors).await, 1);
        assert_eq!(store.count(Collection::Appointments).await, 0);
        assert!(store
            .find_one(Collection::Users, doc! { "email": "x@y.z" })
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn empty_set_matches_without_modifying() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Doctors, doc! { "email": "d@clinic.io", "approved": "false" })
            .await
            .unwrap();

        let ack = store
            .update_one(Collection::Doctors, doc! { "email": "d@clinic.io" }, doc! {}, false)
            .await
            .unwrap();
        assert_eq!((ack.matched_count, ack.modified_count), (1, 0));

        let doctor = store
            .find_one(Collection::Doctors, doc! { "email": "d@clinic.io" })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doctor.get_str("approved").unwrap(), "false");
    }
}
