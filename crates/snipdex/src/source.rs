//! Streams snippets named by an identifier list out of a text corpus.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_stream::try_stream;
use futures::Stream;
use tokio::{
    fs,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::debug;

use crate::{
    error::{IndexerError, IndexerResult},
    identifier::SnippetIdentity,
    lemma::{LemmaProvider, NoLemmas},
    records::Snippet,
};

/// Lazy, single-pass reader over `<id list>` resolved against `<text dir>`.
///
/// At most one snippet is held at a time; consumers decide what to retain.
pub struct SnippetSource {
    id_list: PathBuf,
    text_dir: PathBuf,
    lemmas: Arc<dyn LemmaProvider>,
}

impl SnippetSource {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(id_list: P, text_dir: Q) -> Self {
        Self {
            id_list: id_list.as_ref().to_path_buf(),
            text_dir: text_dir.as_ref().to_path_buf(),
            lemmas: Arc::new(NoLemmas),
        }
    }

    /// Attach a provider for the optional `lemma` field.
    pub fn with_lemmas(mut self, lemmas: Arc<dyn LemmaProvider>) -> Self {
        self.lemmas = lemmas;
        self
    }

    pub fn id_list(&self) -> &Path {
        &self.id_list
    }

    pub fn text_dir(&self) -> &Path {
        &self.text_dir
    }

    /// Yields one snippet per non-blank line, in file order.
    ///
    /// The first malformed identifier or unreadable text file ends the stream
    /// with an error; nothing is skipped.
    pub fn snippets(&self) -> impl Stream<Item = IndexerResult<Snippet>> + '_ {
        try_stream! {
            let file = fs::File::open(&self.id_list)
                .await
                .map_err(|source| IndexerError::Io { path: self.id_list.clone(), source })?;
            let mut lines = BufReader::new(file).lines();
            let mut line_number = 0usize;

            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|source| IndexerError::Io { path: self.id_list.clone(), source })?
            {
                line_number += 1;
                let identifier = line.trim();
                if identifier.is_empty() {
                    continue;
                }

                let identity = SnippetIdentity::parse(identifier, line_number)?;
                let path = identity.text_path(&self.text_dir);
                let text = fs::read_to_string(&path)
                    .await
                    .map_err(|source| IndexerError::MissingFile { path: path.clone(), source })?;
                let lemma = self.lemmas.lemma_for(&identity).await?;
                debug!(id = %identity.id, bytes = text.len(), "read snippet");

                yield Snippet {
                    id: identity.id,
                    text,
                    document_id: identity.document_id,
                    lemma,
                };
            }
        }
    }
}
