use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use futures::TryStreamExt;
use log::{debug, info};
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, FindOneAndUpdateOptions, ReturnDocument},
    results::InsertOneResult,
    Client, Collection, Cursor, Database,
};
use serde::{de::DeserializeOwned, Serialize};

use config::Config;

use crate::context::OpContext;
use crate::document::{from_document, to_document};
use crate::errors::DBError;
use crate::DocumentStore;

/// Where to connect and which database to bind to.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub uri: String,
    pub db_name: String,
    pub app_name: Option<String>,
    pub server_selection_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl ConnectionOptions {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            app_name: None,
            server_selection_timeout: None,
            connect_timeout: None,
        }
    }
}

impl From<&Config> for ConnectionOptions {
    fn from(config: &Config) -> Self {
        Self {
            uri: config.infra.mongo_url.clone(),
            db_name: config.infra.db_name.clone(),
            app_name: config.operation.app_name.clone(),
            server_selection_timeout: config.operation.server_selection_timeout(),
            connect_timeout: config.operation.connect_timeout(),
        }
    }
}

#[derive(Debug, Display, Clone)]
#[display("MongoDBClient {{ client: {:?}, db_name: {} }}", client, db_name)]
pub struct MongoDBClient {
    pub client: Client,
    db: Database,
    db_name: String,
}

impl MongoDBClient {
    /// Builds a driver client for `options.uri` and pings `options.db_name`.
    pub async fn connect(ctx: &OpContext, options: ConnectionOptions) -> Result<Self, DBError> {
        let ConnectionOptions { uri, db_name, app_name, server_selection_timeout, connect_timeout } =
            options;

        let provider = ctx
            .run(async move {
                let mut client_options =
                    ClientOptions::parse(&uri).await.map_err(DBError::Connection)?;
                if app_name.is_some() {
                    client_options.app_name = app_name;
                }
                if server_selection_timeout.is_some() {
                    client_options.server_selection_timeout = server_selection_timeout;
                }
                if connect_timeout.is_some() {
                    client_options.connect_timeout = connect_timeout;
                }

                let client = Client::with_options(client_options).map_err(DBError::Connection)?;
                let db = client.database(&db_name);
                db.run_command(doc! { "ping": 1 }, None).await.map_err(DBError::Connection)?;

                Ok(Self { client, db, db_name })
            })
            .await?;

        info!("Connected to MongoDB database {}", provider.db_name);
        Ok(provider)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn get_collection(&self, collection: &str) -> Collection<Document> {
        self.db.collection(collection)
    }

    /// Lazy counterpart of [`DocumentStore::find`]. The server-side cursor is
    /// released when the returned cursor is exhausted or dropped; `ctx` bounds
    /// only the initial query.
    pub async fn find_cursor(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<Cursor<Document>, DBError> {
        debug!("Opening cursor on {} with filter {}", collection, filter);
        ctx.run(async {
            self.get_collection(collection)
                .find(filter, None)
                .await
                .map_err(|e| DBError::query(collection, e))
        })
        .await
    }

    pub async fn find_one_as<T: DeserializeOwned>(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<Option<T>, DBError> {
        self.find_one(ctx, collection, filter).await?.map(from_document).transpose()
    }

    pub async fn find_as<T: DeserializeOwned>(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<T>, DBError> {
        self.find(ctx, collection, filter).await?.into_iter().map(from_document).collect()
    }
}

#[async_trait]
impl DocumentStore for MongoDBClient {
    async fn save<T: Serialize + Send + Sync>(
        &self,
        ctx: &OpContext,
        collection: &str,
        item: &T,
    ) -> Result<InsertOneResult, DBError> {
        let item = to_document(item)?;
        debug!("Saving document to {}", collection);
        ctx.run(async {
            self.get_collection(collection)
                .insert_one(item, None)
                .await
                .map_err(|e| DBError::write(collection, e))
        })
        .await
    }

    async fn find_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>, DBError> {
        debug!("Finding one document in {} with filter {}", collection, filter);
        ctx.run(async {
            self.get_collection(collection)
                .find_one(filter, None)
                .await
                .map_err(|e| DBError::query(collection, e))
        })
        .await
    }

    async fn find(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<Document>, DBError> {
        debug!("Finding documents in {} with filter {}", collection, filter);
        ctx.run(async {
            let cursor = self
                .get_collection(collection)
                .find(filter, None)
                .await
                .map_err(|e| DBError::query(collection, e))?;
            cursor.try_collect::<Vec<Document>>().await.map_err(|e| DBError::query(collection, e))
        })
        .await
    }

    async fn find_one_and_update(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<Document, DBError> {
        debug!("Updating one document in {} with filter {}", collection, filter);
        let options =
            FindOneAndUpdateOptions::builder().return_document(ReturnDocument::Before).build();
        let previous = ctx
            .run(async {
                self.get_collection(collection)
                    .find_one_and_update(filter, doc! { "$set": update }, options)
                    .await
                    .map_err(|e| DBError::write(collection, e))
            })
            .await?;

        previous.ok_or_else(|| DBError::NotFound { collection: collection.to_string() })
    }

    async fn delete_many(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<u64, DBError> {
        debug!("Deleting documents in {} with filter {}", collection, filter);
        let result = ctx
            .run(async {
                self.get_collection(collection)
                    .delete_many(filter, None)
                    .await
                    .map_err(|e| DBError::write(collection, e))
            })
            .await?;
        Ok(result.deleted_count)
    }
}
