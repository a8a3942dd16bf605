//! Fields and behavior shared by every persisted document.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque concurrency token assigned by the store on every write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// A fresh, unique token.
    pub fn generate() -> Self {
        Self(format!("\"{}\"", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document id plus the revision metadata the store maintains.
///
/// The id is generated once when the document is constructed. The
/// underscore fields are written by the store and must round-trip
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDocument {
    pub id: String,
    #[serde(rename = "_rid", default, skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
    #[serde(rename = "_self", default, skip_serializing_if = "String::is_empty")]
    pub self_link: String,
    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<ETag>,
    #[serde(rename = "_attachments", default, skip_serializing_if = "String::is_empty")]
    pub attachments: String,
    #[serde(rename = "_ts", default, skip_serializing_if = "is_zero")]
    pub timestamp: i64,
}

fn is_zero(ts: &i64) -> bool {
    *ts == 0
}

impl BaseDocument {
    /// A base document with a fresh id and no store metadata.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_id: String::new(),
            self_link: String::new(),
            etag: None,
            attachments: String::new(),
            timestamp: 0,
        }
    }
}

impl Default for BaseDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// A typed document that can be stored in a [`crate::DocumentStore`].
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Short name used in logs.
    const KIND: &'static str;

    fn base(&self) -> &BaseDocument;

    fn partition_key(&self) -> &str;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn etag(&self) -> Option<&ETag> {
        self.base().etag.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_base_document_has_unique_id() {
        let a = BaseDocument::new();
        let b = BaseDocument::new();
        assert_ne!(a.id, b.id);
        assert!(a.etag.is_none());
    }

    #[test]
    fn test_store_metadata_field_names() {
        let base: BaseDocument = serde_json::from_value(json!({
            "id": "doc",
            "_rid": "rid",
            "_self": "dbs/x/colls/y/docs/rid/",
            "_etag": "\"00000000-0000\"",
            "_attachments": "attachments/",
            "_ts": 1718020800
        }))
        .unwrap();
        assert_eq!(base.etag, Some(ETag::new("\"00000000-0000\"")));
        assert_eq!(base.timestamp, 1_718_020_800);

        let value = serde_json::to_value(&base).unwrap();
        assert_eq!(value["_self"], "dbs/x/colls/y/docs/rid/");
        assert_eq!(value["_attachments"], "attachments/");
    }

    #[test]
    fn test_unwritten_document_omits_metadata() {
        let value = serde_json::to_value(BaseDocument::with_id("doc")).unwrap();
        assert_eq!(value, json!({"id": "doc"}));
    }

    #[test]
    fn test_generated_etags_differ() {
        assert_ne!(ETag::generate(), ETag::generate());
    }
}
