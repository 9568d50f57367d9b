//! Full wipe-and-rebuild run: schema, snippets, then documents.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use futures::StreamExt;
use serde::Serialize;
use tokio::pin;
use tracing::info;

use crate::{
    aggregator::DocumentAggregator,
    backend::SearchBackend,
    bulk::{BulkWriter, DEFAULT_BATCH_SIZE},
    config::IndexerConfig,
    error::IndexerResult,
    schema::{IndexLayout, SchemaInitializer, WipeScope},
    source::SnippetSource,
};

const DEFAULT_PROGRESS_INTERVAL: usize = 1_000;

/// Statistics returned after an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexingStats {
    /// Snippet operations submitted, one per identifier line.
    pub snippets_indexed: usize,
    pub documents_indexed: usize,
    pub snippet_batches: usize,
    pub document_batches: usize,
    pub duration: Duration,
}

/// Operations and requests of one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    pub operations: usize,
    pub batches: usize,
}

/// Sequential indexing pipeline.
///
/// Each step finishes before the next starts; the first error ends the run
/// and whatever was already submitted stays in the backend.
pub struct IndexingPipeline {
    backend: Arc<dyn SearchBackend>,
    layout: IndexLayout,
    wipe_scope: WipeScope,
    batch_size: usize,
    document_batch_size: Option<usize>,
    progress_interval: usize,
    fail_on_item_errors: bool,
}

impl IndexingPipeline {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            layout: IndexLayout::default(),
            wipe_scope: WipeScope::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            document_batch_size: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            fail_on_item_errors: true,
        }
    }

    pub fn from_config(backend: Arc<dyn SearchBackend>, config: &IndexerConfig) -> Self {
        let mut pipeline = Self::new(backend)
            .with_layout(config.layout())
            .with_wipe_scope(config.wipe_scope)
            .with_batch_size(config.batch_size)
            .with_progress_interval(config.progress_interval)
            .with_item_failures_fatal(config.fail_on_item_errors);
        if let Some(size) = config.document_batch_size {
            pipeline = pipeline.with_document_batch_size(size);
        }
        pipeline
    }

    pub fn with_layout(mut self, layout: IndexLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_wipe_scope(mut self, scope: WipeScope) -> Self {
        self.wipe_scope = scope;
        self
    }

    /// Override the number of snippet operations per bulk request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Chunk the documents phase too, instead of sending one request.
    pub fn with_document_batch_size(mut self, batch_size: usize) -> Self {
        self.document_batch_size = Some(batch_size.max(1));
        self
    }

    /// Override how often (in number of snippets) progress is logged.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn with_item_failures_fatal(mut self, fatal: bool) -> Self {
        self.fail_on_item_errors = fatal;
        self
    }

    pub async fn run(&self, source: &SnippetSource) -> IndexerResult<IndexingStats> {
        let start = Instant::now();

        SchemaInitializer::new(self.backend.clone(), self.layout.clone())
            .with_scope(self.wipe_scope)
            .initialize()
            .await?;

        let mut aggregator = DocumentAggregator::new();
        let snippets = self.index_snippets(source, &mut aggregator).await?;
        let documents = self.index_documents(aggregator).await?;

        let stats = IndexingStats {
            snippets_indexed: snippets.operations,
            documents_indexed: documents.operations,
            snippet_batches: snippets.batches,
            document_batches: documents.batches,
            duration: start.elapsed(),
        };
        info!(
            snippets = stats.snippets_indexed,
            documents = stats.documents_indexed,
            snippet_batches = stats.snippet_batches,
            document_batches = stats.document_batches,
            elapsed_ms = stats.duration.as_millis(),
            "indexing done"
        );
        Ok(stats)
    }

    /// Streams snippets into the snippets index while recording document membership.
    pub async fn index_snippets(
        &self,
        source: &SnippetSource,
        aggregator: &mut DocumentAggregator,
    ) -> IndexerResult<PhaseStats> {
        info!(
            ids = %source.id_list().display(),
            texts = %source.text_dir().display(),
            "indexing snippets"
        );
        let mut writer = BulkWriter::new(self.backend.clone(), self.layout.snippets.clone())
            .with_batch_size(self.batch_size)
            .with_item_failures_fatal(self.fail_on_item_errors);

        let stream = source.snippets();
        pin!(stream);
        let mut staged = 0usize;
        while let Some(snippet) = stream.next().await {
            let snippet = snippet?;
            aggregator.observe(&snippet);
            writer.stage(&snippet.id, &snippet.record())?;
            writer.maybe_flush().await?;
            staged += 1;
            if staged % self.progress_interval == 0 {
                info!(
                    snippets = staged,
                    documents = aggregator.document_count(),
                    last = %snippet.id,
                    "indexed snippets"
                );
            }
        }
        writer.flush().await?;

        Ok(PhaseStats {
            operations: writer.operations_flushed(),
            batches: writer.batches_flushed(),
        })
    }

    /// Consumes the aggregator and writes one record per document.
    pub async fn index_documents(&self, aggregator: DocumentAggregator) -> IndexerResult<PhaseStats> {
        info!(documents = aggregator.document_count(), "indexing documents");
        let mut writer = BulkWriter::new(self.backend.clone(), self.layout.documents.clone())
            .with_item_failures_fatal(self.fail_on_item_errors);
        writer = match self.document_batch_size {
            Some(size) => writer.with_batch_size(size),
            None => writer.unbounded(),
        };

        for document in aggregator.finalize() {
            writer.stage(&document.id, &document.record())?;
            writer.maybe_flush().await?;
        }
        writer.flush().await?;

        Ok(PhaseStats {
            operations: writer.operations_flushed(),
            batches: writer.batches_flushed(),
        })
    }
}
