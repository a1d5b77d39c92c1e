use std::time::Duration;

use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DBError {
    #[error("Unable to connect to MongoDB: {0}")]
    Connection(#[source] mongodb::error::Error),

    #[error("Write to collection {collection} rejected: {source}")]
    Write {
        collection: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Query on collection {collection} failed: {source}")]
    Query {
        collection: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("No document in collection {collection} matched the filter")]
    NotFound { collection: String },

    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Value serialized to {0} instead of a document")]
    NotADocument(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DBError {
    pub(crate) fn write(collection: &str, source: mongodb::error::Error) -> Self {
        DBError::Write { collection: collection.to_string(), source }
    }

    pub(crate) fn query(collection: &str, source: mongodb::error::Error) -> Self {
        DBError::Query { collection: collection.to_string(), source }
    }

    /// True for the serialization family, i.e. the value never reached the store.
    pub fn is_serialization(&self) -> bool {
        matches!(
            self,
            DBError::BsonSerialization(_) | DBError::BsonDeserialization(_) | DBError::NotADocument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::DBError;

    #[test]
    fn test_display() {
        let err = DBError::NotFound { collection: "cars".to_string() };
        assert_eq!(err.to_string(), "No document in collection cars matched the filter");

        let err = DBError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Operation timed out after 1.5s");

        assert_eq!(DBError::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_serialization() {
        assert!(DBError::NotADocument("Int32".to_string()).is_serialization());
        assert!(!DBError::Cancelled.is_serialization());
        assert!(!DBError::NotFound { collection: "cars".to_string() }.is_serialization());
    }
}
