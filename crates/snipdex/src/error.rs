use std::path::PathBuf;

use snipdex_http::HttpError;
use thiserror::Error;

pub type IndexerResult<T> = Result<T, IndexerError>;

/// Every variant is fatal to an indexing run.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Snippet file {path} is missing or unreadable: {source}")]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snippet identifier on line {line}: {identifier:?} lacks the `_paragraph_` separator")]
    MalformedIdentifier { line: usize, identifier: String },

    #[error("Bulk request to index `{index}` failed: {source}")]
    BackendRequest {
        index: String,
        #[source]
        source: HttpError,
    },

    #[error("Bulk request to index `{index}` rejected {failed} operation(s); first reason: {first_reason}")]
    BulkItemFailures {
        index: String,
        failed: usize,
        first_reason: String,
    },

    #[error("Schema initialization failed for `{index}`: {source}")]
    SchemaInit {
        index: String,
        #[source]
        source: HttpError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<::config::ConfigError> for IndexerError {
    fn from(err: ::config::ConfigError) -> Self {
        IndexerError::Config(err.to_string())
    }
}
