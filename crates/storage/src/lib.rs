pub use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
pub use mongodb::results::InsertOneResult;
pub use mongodb::Cursor;
pub use tokio_util::sync::CancellationToken;

pub use context::OpContext;
pub use db_provider::DocumentStore;
pub use document::{from_document, to_document};
pub use errors::DBError;
pub use mongodb_client::{ConnectionOptions, MongoDBClient};

pub mod context;
pub mod db_provider;
pub mod document;
pub mod errors;
pub mod mongodb_client;
