//! Stored form of a transaction tree.
//!
//! Documents are JSON. The current envelope wraps the tree with a format
//! version and a save timestamp; a bare tree object is accepted on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::Node;
use crate::infrastructure::traits::DocumentStore;

pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDocument {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub tree: Node,
}

impl TransactionDocument {
    pub fn new(tree: Node) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            saved_at: Some(Utc::now()),
            tree,
        }
    }

    pub fn parse(key: &str, content: &str) -> ApplicationResult<Self> {
        let document_err = |source| ApplicationError::Document {
            key: key.to_string(),
            source,
        };
        let value: serde_json::Value = serde_json::from_str(content).map_err(document_err)?;
        if value.get("tree").is_some() {
            serde_json::from_value(value).map_err(document_err)
        } else {
            let tree = serde_json::from_value(value).map_err(document_err)?;
            Ok(Self {
                version: DOCUMENT_VERSION,
                saved_at: None,
                tree,
            })
        }
    }

    pub fn to_json(&self, key: &str) -> ApplicationResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| ApplicationError::Document {
            key: key.to_string(),
            source,
        })
    }
}

/// Keys double as file stems, so they are restricted to `[A-Za-z0-9_-]`.
pub fn validate_key(key: &str) -> ApplicationResult<()> {
    let reason = if key.is_empty() {
        Some("must not be empty")
    } else if key.starts_with('.') || key.starts_with('-') {
        Some("must not start with '.' or '-'")
    } else if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some("only ASCII letters, digits, '-' and '_' are allowed")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ApplicationError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Reads the whole tree stored under `key`.
pub fn read_tree(store: &dyn DocumentStore, key: &str) -> ApplicationResult<Node> {
    validate_key(key)?;
    let content = store
        .get(key)
        .with_key_context("read transaction", key)?
        .ok_or_else(|| ApplicationError::TransactionNotFound(key.to_string()))?;
    Ok(TransactionDocument::parse(key, &content)?.tree)
}

/// Writes the whole tree under `key`. Last write wins.
pub fn write_tree(store: &dyn DocumentStore, key: &str, tree: &Node) -> ApplicationResult<()> {
    validate_key(key)?;
    let content = TransactionDocument::new(tree.clone()).to_json(key)?;
    debug!("write_tree: key={} bytes={}", key, content.len());
    store
        .put(key, &content)
        .with_key_context("write transaction", key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("business-permit")]
    #[case("cedula_2024")]
    #[case("TX1")]
    fn given_plain_key_when_validating_then_ok(#[case] key: &str) {
        assert!(validate_key(key).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("../etc")]
    #[case(".hidden")]
    #[case("with space")]
    #[case("a/b")]
    fn given_unsafe_key_when_validating_then_rejected(#[case] key: &str) {
        assert!(matches!(
            validate_key(key),
            Err(ApplicationError::InvalidKey { .. })
        ));
    }

    #[test]
    fn given_bare_tree_json_when_parsing_then_wraps_in_envelope() {
        let content = r#"{"id": "root", "kind": "condition", "service": "Cedula"}"#;

        let doc = TransactionDocument::parse("cedula", content).unwrap();

        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert!(doc.saved_at.is_none());
        assert_eq!(
            doc.tree.as_condition().unwrap().meta.service.as_deref(),
            Some("Cedula")
        );
    }

    #[test]
    fn given_garbage_when_parsing_then_document_error() {
        let result = TransactionDocument::parse("k", "{not json");

        assert!(matches!(result, Err(ApplicationError::Document { .. })));
    }
}
