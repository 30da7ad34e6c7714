use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use invoice_types::{Thread, ThreadId};

use crate::error::{PersistError, Result};

/// MongoDB-specific Thread model (uses ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MongoThread {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for MongoThread {
    fn default() -> Self {
        Self::new()
    }
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: ThreadId::new(thread.id.to_hex()),
            name: thread.name,
            created_at: thread.created_at,
        }
    }
}

pub fn parse_object_id(id: &ThreadId) -> Result<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_uses_hex_id() {
        let mongo = MongoThread::new();
        let hex = mongo.id.to_hex();
        let thread: Thread = mongo.into();

        assert_eq!(thread.id.as_str(), hex);
        assert_eq!(parse_object_id(&thread.id).unwrap().to_hex(), hex);
    }

    #[test]
    fn test_parse_rejects_non_object_ids() {
        let err = parse_object_id(&ThreadId::new("not-an-oid")).unwrap_err();
        assert!(matches!(err, PersistError::InvalidObjectId(_)));
    }
}
