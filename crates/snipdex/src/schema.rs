//! Index layout and idempotent (re)creation of both indices.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    backend::{IndexTarget, SearchBackend},
    error::{IndexerError, IndexerResult},
};

pub const SNIPPETS_INDEX: &str = "snippets";
pub const DOCUMENTS_INDEX: &str = "documents";

/// Analyzer for text that arrives already tokenized.
const PRETOKENIZED_ANALYZER: &str = "simple";

/// Which indices are removed before the schema is recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WipeScope {
    /// Every index on the cluster.
    #[default]
    All,
    /// Only the snippets and documents indices.
    Managed,
}

/// The two indices a run writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    pub snippets: IndexTarget,
    pub documents: IndexTarget,
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            snippets: IndexTarget::new(SNIPPETS_INDEX),
            documents: IndexTarget::new(DOCUMENTS_INDEX),
        }
    }
}

impl IndexLayout {
    /// Elasticsearch 6.x layout: each index carries a single mapping type.
    pub fn legacy(snippets: &str, documents: &str) -> Self {
        Self {
            snippets: IndexTarget::new(snippets).with_doc_type("snippet"),
            documents: IndexTarget::new(documents).with_doc_type("document"),
        }
    }

    pub fn snippets_body(&self) -> Value {
        mappings_body(
            &self.snippets,
            json!({
                "text": {"type": "text", "analyzer": PRETOKENIZED_ANALYZER},
                "lemma": {"type": "text", "analyzer": PRETOKENIZED_ANALYZER},
                "document": {"type": "keyword"},
            }),
        )
    }

    pub fn documents_body(&self) -> Value {
        // keyword fields hold arrays natively; `sub` keeps its order in _source.
        mappings_body(&self.documents, json!({"sub": {"type": "keyword"}}))
    }
}

fn mappings_body(target: &IndexTarget, properties: Value) -> Value {
    let mapping = json!({ "properties": properties });
    match &target.doc_type {
        Some(doc_type) => json!({ "mappings": { doc_type.as_str(): mapping } }),
        None => json!({ "mappings": mapping }),
    }
}

/// Wipes existing indices and creates empty `snippets` and `documents` indices.
pub struct SchemaInitializer {
    backend: Arc<dyn SearchBackend>,
    layout: IndexLayout,
    scope: WipeScope,
}

impl SchemaInitializer {
    pub fn new(backend: Arc<dyn SearchBackend>, layout: IndexLayout) -> Self {
        Self {
            backend,
            layout,
            scope: WipeScope::default(),
        }
    }

    pub fn with_scope(mut self, scope: WipeScope) -> Self {
        self.scope = scope;
        self
    }

    /// Safe to call repeatedly: each call leaves exactly two empty indices.
    pub async fn initialize(&self) -> IndexerResult<()> {
        let (pattern, ignore_unavailable) = match self.scope {
            WipeScope::All => ("_all".to_string(), false),
            WipeScope::Managed => (
                format!("{},{}", self.layout.snippets.name, self.layout.documents.name),
                true,
            ),
        };
        self.backend
            .delete_indices(&pattern, ignore_unavailable)
            .await
            .map_err(|source| IndexerError::SchemaInit {
                index: pattern.clone(),
                source,
            })?;
        info!(pattern = %pattern, "removed existing indices");

        for (target, body) in [
            (&self.layout.documents, self.layout.documents_body()),
            (&self.layout.snippets, self.layout.snippets_body()),
        ] {
            self.backend
                .create_index(&target.name, &body)
                .await
                .map_err(|source| IndexerError::SchemaInit {
                    index: target.name.clone(),
                    source,
                })?;
            info!(index = %target.name, "created index");
        }
        Ok(())
    }
}
