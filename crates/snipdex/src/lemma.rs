//! Optional source for the `lemma` field of snippet records.
//!
//! Lemmatization itself happens outside this crate; a provider only hands over
//! lemma text that an external lemmatizer already produced.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::trace;

use crate::{
    error::{IndexerError, IndexerResult},
    identifier::SnippetIdentity,
};

#[async_trait]
pub trait LemmaProvider: Send + Sync {
    /// Lemma text for a snippet, or `None` when none is available.
    async fn lemma_for(&self, identity: &SnippetIdentity) -> IndexerResult<Option<String>>;
}

/// Leaves the `lemma` field unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLemmas;

#[async_trait]
impl LemmaProvider for NoLemmas {
    async fn lemma_for(&self, _identity: &SnippetIdentity) -> IndexerResult<Option<String>> {
        Ok(None)
    }
}

/// Reads precomputed lemma files laid out like the text corpus:
/// `<root>/<documentId>/paragraph_<fragmentId>.txt`.
#[derive(Debug, Clone)]
pub struct LemmaDirectory {
    root: PathBuf,
}

impl LemmaDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl LemmaProvider for LemmaDirectory {
    async fn lemma_for(&self, identity: &SnippetIdentity) -> IndexerResult<Option<String>> {
        let path = identity.text_path(&self.root);
        match fs::read_to_string(&path).await {
            Ok(lemma) => Ok(Some(lemma)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                trace!(path = %path.display(), "no lemma file for snippet");
                Ok(None)
            }
            Err(source) => Err(IndexerError::Io { path, source }),
        }
    }
}
