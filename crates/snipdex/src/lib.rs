//! Snipdex - bulk indexer for pre-segmented text
//!
//! Snipdex reads a list of snippet identifiers (`<documentId>_paragraph_<fragmentId>`),
//! loads each snippet's text from a directory tree, and writes two indices to
//! Elasticsearch: one record per snippet and one record per parent document
//! listing its snippets in natural order.
//!
//! Every run is a full rebuild: existing indices are removed first, then the
//! snippet phase streams batched bulk requests, and the documents phase
//! follows once the whole list has been read.

pub mod aggregator;
pub mod backend;
pub mod bulk;
pub mod config;
pub mod error;
pub mod identifier;
pub mod lemma;
pub mod natural_key;
pub mod pipeline;
pub mod records;
pub mod schema;
pub mod source;

pub use aggregator::DocumentAggregator;
pub use backend::{BulkResponse, ElasticsearchBackend, IndexTarget, SearchBackend};
#[cfg(feature = "test-util")]
pub use backend::memory::InMemoryBackend;
pub use bulk::BulkWriter;
pub use config::{ConfigLoader, IndexerConfig, MappingType};
pub use error::{IndexerError, IndexerResult};
pub use identifier::SnippetIdentity;
pub use lemma::{LemmaDirectory, LemmaProvider, NoLemmas};
pub use natural_key::{natural_cmp, natural_key, sort_natural, NaturalKey};
pub use pipeline::{IndexingPipeline, IndexingStats, PhaseStats};
pub use records::{Document, Snippet};
pub use schema::{IndexLayout, SchemaInitializer, WipeScope};
pub use source::SnippetSource;
