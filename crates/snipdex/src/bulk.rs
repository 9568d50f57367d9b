//! Batched NDJSON writes to one index.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    backend::{IndexTarget, SearchBackend},
    error::{IndexerError, IndexerResult},
    records::BulkOperationHeader,
};

/// Operations per bulk request unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Buffers index operations for one target and submits them in batches.
///
/// A failed [`flush`](BulkWriter::flush) leaves the buffer untouched so the
/// caller can retry it; nothing is retried automatically.
pub struct BulkWriter {
    backend: Arc<dyn SearchBackend>,
    target: IndexTarget,
    batch_size: usize,
    fail_on_item_errors: bool,
    buffer: String,
    pending: usize,
    batches_flushed: usize,
    operations_flushed: usize,
}

impl BulkWriter {
    pub fn new(backend: Arc<dyn SearchBackend>, target: IndexTarget) -> Self {
        Self {
            backend,
            target,
            batch_size: DEFAULT_BATCH_SIZE,
            fail_on_item_errors: true,
            buffer: String::new(),
            pending: 0,
            batches_flushed: 0,
            operations_flushed: 0,
        }
    }

    /// Override the number of operations that triggers [`maybe_flush`](BulkWriter::maybe_flush).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Never flush from [`maybe_flush`](BulkWriter::maybe_flush); everything goes
    /// out in the explicit final [`flush`](BulkWriter::flush).
    pub fn unbounded(mut self) -> Self {
        self.batch_size = usize::MAX;
        self
    }

    /// Whether rejected items in an accepted batch abort the run (default) or are only logged.
    pub fn with_item_failures_fatal(mut self, fatal: bool) -> Self {
        self.fail_on_item_errors = fatal;
        self
    }

    pub fn target(&self) -> &IndexTarget {
        &self.target
    }

    /// Operations staged but not yet submitted.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn batches_flushed(&self) -> usize {
        self.batches_flushed
    }

    pub fn operations_flushed(&self) -> usize {
        self.operations_flushed
    }

    /// Append an index operation for `id`.
    pub fn stage<T: Serialize + ?Sized>(&mut self, id: &str, body: &T) -> IndexerResult<()> {
        // Serialize both lines before touching the buffer so a failure cannot leave half an operation.
        let header = serde_json::to_string(&BulkOperationHeader::index(id))?;
        let body = serde_json::to_string(body)?;
        self.buffer.push_str(&header);
        self.buffer.push('\n');
        self.buffer.push_str(&body);
        self.buffer.push('\n');
        self.pending += 1;
        Ok(())
    }

    /// Flush when the buffer holds a full batch. Returns whether a flush happened.
    pub async fn maybe_flush(&mut self) -> IndexerResult<bool> {
        if self.pending < self.batch_size {
            return Ok(false);
        }
        self.flush().await?;
        Ok(true)
    }

    /// Submit every staged operation as one bulk request. No-op when empty.
    pub async fn flush(&mut self) -> IndexerResult<()> {
        if self.pending == 0 {
            return Ok(());
        }

        let response = self
            .backend
            .bulk(&self.target, &self.buffer)
            .await
            .map_err(|source| IndexerError::BackendRequest {
                index: self.target.name.clone(),
                source,
            })?;

        if response.errors {
            let failures = response.failures();
            let first_reason = failures
                .first()
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            if self.fail_on_item_errors {
                return Err(IndexerError::BulkItemFailures {
                    index: self.target.name.clone(),
                    failed: failures.len(),
                    first_reason,
                });
            }
            warn!(
                index = %self.target.name,
                failed = failures.len(),
                first_reason = %first_reason,
                "backend rejected some bulk operations"
            );
        }

        debug!(
            index = %self.target.name,
            operations = self.pending,
            bytes = self.buffer.len(),
            took_ms = response.took,
            "flushed bulk batch"
        );
        self.batches_flushed += 1;
        self.operations_flushed += self.pending;
        self.buffer.clear();
        self.pending = 0;
        Ok(())
    }
}
