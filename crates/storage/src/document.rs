use mongodb::bson::{self, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::DBError;

/// Serializes `item` into an ordered BSON document, for use as a stored
/// record, a filter or an update payload.
pub fn to_document<T: Serialize + ?Sized>(item: &T) -> Result<Document, DBError> {
    match bson::to_bson(item)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(DBError::NotADocument(format!("{:?}", other.element_type()))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, DBError> {
    let item = bson::from_bson(Bson::Document(doc))?;
    Ok(item)
}
