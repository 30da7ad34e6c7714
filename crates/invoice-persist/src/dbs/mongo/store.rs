use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use invoice_types::{Thread, ThreadId};

use crate::dbs::mongo::models::{parse_object_id, MongoThread};
use crate::error::{PersistError, Result};
use crate::store::{fallback_thread_name, normalize_name, ThreadStore};

#[derive(Clone)]
pub struct MongoThreadStore {
    collection: Collection<MongoThread>,
}

impl MongoThreadStore {
    /// Connect to MongoDB and use the `threads` collection of `database`
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        Ok(Self::new(&client, database))
    }

    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    async fn set_name(&self, id: &ThreadId, name: &str) -> Result<()> {
        let object_id = parse_object_id(id)?;
        let filter = doc! { "_id": object_id };
        let update = doc! {
            "$set": {
                "name": name,
                "updated_at": bson::to_bson(&Utc::now())?
            }
        };

        let result = self.collection.update_one(filter, update).await?;
        if result.matched_count == 0 {
            return Err(PersistError::ThreadNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ThreadStore for MongoThreadStore {
    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let threads: Vec<MongoThread> = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads.into_iter().map(Thread::from).collect())
    }

    async fn create_thread(&self) -> Result<Thread> {
        let thread = MongoThread::new();
        self.collection.insert_one(&thread).await?;
        Ok(thread.into())
    }

    async fn get_thread(&self, id: &ThreadId) -> Result<Option<Thread>> {
        let filter = doc! { "_id": parse_object_id(id)? };
        Ok(self.collection.find_one(filter).await?.map(Thread::from))
    }

    async fn rename_thread(&self, id: &ThreadId, name: &str) -> Result<()> {
        self.set_name(id, normalize_name(name)?).await
    }

    async fn generate_thread_name(&self, id: &ThreadId) -> Result<Thread> {
        let mut thread = self
            .get_thread(id)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;

        let name = fallback_thread_name(&thread);
        self.set_name(id, &name).await?;
        thread.name = Some(name);
        Ok(thread)
    }
}
