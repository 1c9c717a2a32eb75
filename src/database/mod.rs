use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Database};
use std::time::Duration;

use crate::models::{bson_to_json, Collection, DeleteAck, InsertAck, UpdateAck};
use crate::utils::StoreError;

#[cfg(test)]
pub mod memory;

/// One round trip against the document store per call.
///
/// Filters are exact-equality documents. Handlers hold this behind
/// `web::Data<dyn DocumentStore>`, so every implementation must be shareable
/// across workers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, StoreError>;

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertAck, StoreError>;

    /// Applies `changes` with `$set` semantics to the first match.
    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        changes: Document,
        upsert: bool,
    ) -> Result<UpdateAck, StoreError>;

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<DeleteAck, StoreError>;
}

/// Driver-backed store. `Database` handles are cheap clones over the
/// client's own connection pool.
#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .build(),
        );
        client_options.app_name = Some("smartcare-gateway".to_string());

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        Ok(Self { db })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.name())
    }
}

#[async_trait]
impl DocumentStore for MongoDB {
    async fn find(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection(collection).find(filter).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertAck, StoreError> {
        let result = self.collection(collection).insert_one(document).await?;
        Ok(InsertAck {
            acknowledged: true,
            inserted_id: bson_to_json(result.inserted_id),
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        changes: Document,
        upsert: bool,
    ) -> Result<UpdateAck, StoreError> {
        let options = mongodb::options::UpdateOptions::builder()
            .upsert(upsert)
            .build();

        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": changes })
            .with_options(options)
            .await?;

        let upserted_count = u64::from(result.upserted_id.is_some());
        Ok(UpdateAck {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count,
            upserted_id: result.upserted_id.map(bson_to_json),
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<DeleteAck, StoreError> {
        let result = self.collection(collection).delete_one(filter).await?;
        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }
}

/// Stands in for the store when the startup connection failed, so the
/// server still answers every route with its 500.
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn error(&self) -> StoreError {
        StoreError::NotConnected(self.reason.clone())
    }
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn find(
        &self,
        _collection: Collection,
        _filter: Document,
    ) -> Result<Vec<Document>, StoreError> {
        Err(self.error())
    }

    async fn find_one(
        &self,
        _collection: Collection,
        _filter: Document,
    ) -> Result<Option<Document>, StoreError> {
        Err(self.error())
    }

    async fn insert_one(
        &self,
        _collection: Collection,
        _document: Document,
    ) -> Result<InsertAck, StoreError> {
        Err(self.error())
    }

    async fn update_one(
        &self,
        _collection: Collection,
        _filter: Document,
        _changes: Document,
        _upsert: bool,
    ) -> Result<UpdateAck, StoreError> {
        Err(self.error())
    }

    async fn delete_one(
        &self,
        _collection: Collection,
        _filter: Document,
    ) -> Result<DeleteAck, StoreError> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = UnavailableStore::new("dns lookup failed");

        let err = store.find(Collection::Doctors, doc! {}).await.unwrap_err();
        assert!(matches!(err, StoreError::NotConnected(_)));

        let err = store
            .update_one(Collection::Users, doc! { "email": "a@b.c" }, doc! {}, true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotConnected(_)));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let config = crate::config::Config::from_env();
        let uri = config.database_uri().expect("database credentials not configured");

        let store = MongoDB::new(uri, &config.database_name).await;
        assert!(store.is_ok());
    }
}
