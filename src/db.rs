use anyhow::{Context, Result};
use mongodb::options::ClientOptions;
use mongodb::{
    Client, Collection, Database as MongoDatabase,
    bson::{Document, doc, oid::ObjectId},
};
use once_cell::sync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::data_models::StoredDocument;

/// Global database instance
static DB: OnceCell<Database> = OnceCell::new();

/// Collection names as constants for consistency
pub mod collections {
    pub const RESULTS: &str = "results";
}

/// Connection handle plus typed collection access
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    /// Connect and ping. Useful for tests with a throwaway database name.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;

        log::info!("Connected to MongoDB database: {}", db_name);

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.mongo_uri, &config.mongo_db_name).await
    }

    /// Initialize the global database instance.
    /// Call this once at application startup.
    pub async fn init_global(config: &Config) -> Result<&'static Database> {
        let db = Self::from_config(config).await?;
        DB.set(db)
            .map_err(|_| anyhow::anyhow!("Database already initialized"))?;
        Self::get()
    }

    /// Get the global database instance.
    pub fn get() -> Result<&'static Database> {
        DB.get()
            .ok_or_else(|| anyhow::anyhow!("Database not initialized. Call Database::init_global() first."))
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.db.collection(name)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn results(&self) -> Collection<StoredDocument> {
        self.collection(collections::RESULTS)
    }
}

/// Thin typed wrapper over one collection.
pub struct Repository<T>
where
    T: Send + Sync,
{
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    pub async fn insert_many(&self, docs: &[T]) -> Result<Vec<ObjectId>> {
        let result = self
            .collection
            .insert_many(docs)
            .await
            .context("Failed to insert documents")?;

        Ok(result
            .inserted_ids
            .values()
            .filter_map(|id| id.as_object_id())
            .collect())
    }

    pub async fn find(&self, filter: Document) -> Result<Vec<T>> {
        use futures::TryStreamExt;

        let cursor = self
            .collection
            .find(filter)
            .await
            .context("Failed to execute find query")?;

        cursor
            .try_collect()
            .await
            .context("Failed to collect results")
    }

    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.collection
            .count_documents(filter)
            .await
            .context("Failed to count documents")
    }
}

/// Stored search results
pub struct ResultRepo {
    repo: Repository<StoredDocument>,
}

impl ResultRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.results()),
        }
    }

    pub async fn insert_many(&self, docs: &[StoredDocument]) -> Result<Vec<ObjectId>> {
        if docs.is_empty() {
            return Ok(vec![]);
        }
        self.repo.insert_many(docs).await
    }

    pub async fn find_by_session(&self, session_id: i64) -> Result<Vec<StoredDocument>> {
        self.repo.find(doc! { "session_id": session_id }).await
    }

    pub async fn count_by_query(&self, query: &str, source_id: i64) -> Result<u64> {
        self.repo
            .count(doc! { "query": query, "source_id": source_id })
            .await
    }
}
