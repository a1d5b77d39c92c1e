use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::results::InsertOneResult;
use serde::Serialize;

use crate::context::OpContext;
use crate::errors::DBError;

/// The verbs application code needs from a document store.
///
/// Filters and updates are handed to the store verbatim; results come back in
/// the driver's own types.
#[async_trait]
pub trait DocumentStore {
    async fn save<T: Serialize + Send + Sync>(
        &self,
        ctx: &OpContext,
        collection: &str,
        item: &T,
    ) -> Result<InsertOneResult, DBError>;

    async fn find_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>, DBError>;

    async fn find(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<Document>, DBError>;

    /// Merges `update` into the first match with `$set` and returns the match
    /// as it was before the write.
    async fn find_one_and_update(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<Document, DBError>;

    async fn delete_many(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: Document,
    ) -> Result<u64, DBError>;
}
