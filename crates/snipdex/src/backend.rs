//! Search backend seam.
//!
//! The pipeline needs three calls from the backend: wipe indices, create an
//! index with a mapping, and submit an NDJSON bulk batch. [`ElasticsearchBackend`]
//! speaks the Elasticsearch REST API; [`memory::InMemoryBackend`] mimics it for tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use snipdex_http::{HttpClientTrait, HttpConfig, HttpError, Method, Payload, Response};
use tracing::{debug, warn};

use crate::error::{IndexerError, IndexerResult};

/// Default backend address when none is given.
pub const DEFAULT_HOST: &str = "http://localhost:9200";

/// An index plus the legacy mapping type (Elasticsearch 6.x) it is written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub name: String,
    pub doc_type: Option<String>,
}

impl IndexTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc_type: None,
        }
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn bulk_path(&self) -> String {
        match &self.doc_type {
            Some(doc_type) => format!("{}/{}/_bulk", self.name, doc_type),
            None => format!("{}/_bulk", self.name),
        }
    }
}

/// Subset of the bulk API response the writer inspects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl BulkResponse {
    /// Error reasons of the operations the backend rejected.
    pub fn failures(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.as_object()?.values().next()?.get("error"))
            .map(|error| {
                error
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string())
            })
            .collect()
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Delete the indices matched by `pattern` (`_all`, or a comma-separated list).
    async fn delete_indices(&self, pattern: &str, ignore_unavailable: bool) -> Result<(), HttpError>;

    /// Create `index` with the given settings/mappings body.
    async fn create_index(&self, index: &str, body: &Value) -> Result<(), HttpError>;

    /// Submit one NDJSON bulk batch.
    async fn bulk(&self, target: &IndexTarget, body: &str) -> Result<BulkResponse, HttpError>;
}

/// Elasticsearch over HTTP.
///
/// Requests go to the first host; a host is skipped only when the connection
/// itself fails, so a request the server answered is never sent twice.
pub struct ElasticsearchBackend {
    client: Arc<dyn HttpClientTrait>,
    hosts: Vec<String>,
}

impl ElasticsearchBackend {
    pub fn new<I, S>(client: Arc<dyn HttpClientTrait>, hosts: I) -> IndexerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validated = Vec::new();
        for host in hosts {
            validated.push(normalize_host(host.as_ref())?);
        }
        if validated.is_empty() {
            return Err(IndexerError::Config(
                "at least one backend host is required".to_string(),
            ));
        }
        Ok(Self {
            client,
            hosts: validated,
        })
    }

    /// Build the backend on a fresh reqwest client.
    pub fn connect<I, S>(hosts: I, http: HttpConfig) -> IndexerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let client = snipdex_http::shared_client(http)
            .map_err(|e| IndexerError::Config(format!("cannot build HTTP client: {e}")))?;
        Self::new(client, hosts)
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Payload>,
    ) -> Result<Response, HttpError> {
        let mut last_error = None;
        for host in &self.hosts {
            let url = format!("{}/{}", host, path.trim_start_matches('/'));
            match self.client.request(method.clone(), &url, body.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_connect() => {
                    warn!(host = %host, error = %err, "backend host unreachable, trying next host");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error.unwrap_or(HttpError::NoHosts))
    }
}

/// Accepts `scheme://host[:port]` or bare `host[:port]`, which is taken as plain http.
fn normalize_host(host: &str) -> IndexerResult<String> {
    let host = host.trim();
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    let url = url::Url::parse(&candidate)
        .map_err(|e| IndexerError::Config(format!("invalid backend host {host:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(IndexerError::Config(format!(
            "invalid backend host {host:?}: expected an http or https address"
        )));
    }
    Ok(candidate.trim_end_matches('/').to_string())
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn delete_indices(&self, pattern: &str, ignore_unavailable: bool) -> Result<(), HttpError> {
        let path = if ignore_unavailable {
            format!("{pattern}?ignore_unavailable=true")
        } else {
            pattern.to_string()
        };
        debug!(pattern, "deleting indices");
        self.send(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), HttpError> {
        debug!(index, "creating index");
        self.send(Method::PUT, index, Some(Payload::json(body)?)).await?;
        Ok(())
    }

    async fn bulk(&self, target: &IndexTarget, body: &str) -> Result<BulkResponse, HttpError> {
        let response = self
            .send(Method::POST, &target.bulk_path(), Some(Payload::ndjson(body)))
            .await?;
        Ok(response.json::<BulkResponse>().await?)
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod memory {
    //! In-process stand-in for Elasticsearch.

    use std::collections::{BTreeMap, VecDeque};

    use parking_lot::Mutex;
    use serde_json::Value;
    use snipdex_http::{HttpError, StatusCode};

    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct StoredIndex {
        pub body: Value,
        pub docs: BTreeMap<String, Value>,
    }

    /// One bulk request as the backend received it.
    #[derive(Debug, Clone, PartialEq)]
    pub struct BulkCall {
        pub target: IndexTarget,
        pub operations: Vec<(String, Value)>,
    }

    #[derive(Default)]
    struct State {
        indices: BTreeMap<String, StoredIndex>,
        bulk_calls: Vec<BulkCall>,
        bulk_faults: VecDeque<HttpError>,
        creations: Vec<String>,
        deletions: Vec<String>,
    }

    /// Keeps indices in memory, records every call, and can be told to fail
    /// upcoming bulk requests.
    #[derive(Default)]
    pub struct InMemoryBackend {
        state: Mutex<State>,
    }

    impl InMemoryBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next bulk request fail with `error` instead of being applied.
        pub fn fail_next_bulk(&self, error: HttpError) {
            self.state.lock().bulk_faults.push_back(error);
        }

        /// Pre-populate an index, as if left over from an earlier run.
        pub fn seed_index(&self, name: &str, docs: &[(&str, Value)]) {
            let mut state = self.state.lock();
            let index = state.indices.entry(name.to_string()).or_default();
            for (id, doc) in docs {
                index.docs.insert(id.to_string(), doc.clone());
            }
        }

        pub fn index_names(&self) -> Vec<String> {
            self.state.lock().indices.keys().cloned().collect()
        }

        pub fn index(&self, name: &str) -> Option<StoredIndex> {
            self.state.lock().indices.get(name).cloned()
        }

        pub fn doc(&self, index: &str, id: &str) -> Option<Value> {
            self.state
                .lock()
                .indices
                .get(index)
                .and_then(|stored| stored.docs.get(id).cloned())
        }

        pub fn bulk_calls(&self) -> Vec<BulkCall> {
            self.state.lock().bulk_calls.clone()
        }

        /// Number of operations in each bulk call against `index`, in order.
        pub fn batch_sizes(&self, index: &str) -> Vec<usize> {
            self.state
                .lock()
                .bulk_calls
                .iter()
                .filter(|call| call.target.name == index)
                .map(|call| call.operations.len())
                .collect()
        }

        pub fn creations(&self) -> Vec<String> {
            self.state.lock().creations.clone()
        }

        pub fn deletions(&self) -> Vec<String> {
            self.state.lock().deletions.clone()
        }
    }

    fn rejected(status: StatusCode, message: impl Into<String>) -> HttpError {
        HttpError::HttpStatus {
            status,
            message: message.into(),
        }
    }

    fn parse_operations(body: &str) -> Result<Vec<(String, Value)>, HttpError> {
        let mut lines = body.lines().filter(|line| !line.trim().is_empty());
        let mut operations = Vec::new();
        while let Some(header) = lines.next() {
            let header: Value = serde_json::from_str(header)?;
            let id = header
                .pointer("/index/_id")
                .and_then(Value::as_str)
                .ok_or_else(|| rejected(StatusCode::BAD_REQUEST, "bulk header without index._id"))?
                .to_string();
            let source = lines
                .next()
                .ok_or_else(|| rejected(StatusCode::BAD_REQUEST, "bulk header without body"))?;
            operations.push((id, serde_json::from_str(source)?));
        }
        Ok(operations)
    }

    #[async_trait]
    impl SearchBackend for InMemoryBackend {
        async fn delete_indices(
            &self,
            pattern: &str,
            ignore_unavailable: bool,
        ) -> Result<(), HttpError> {
            let mut state = self.state.lock();
            state.deletions.push(pattern.to_string());
            if pattern == "_all" {
                state.indices.clear();
                return Ok(());
            }
            for name in pattern.split(',') {
                if state.indices.remove(name).is_none() && !ignore_unavailable {
                    return Err(rejected(
                        StatusCode::NOT_FOUND,
                        format!("index_not_found_exception: {name}"),
                    ));
                }
            }
            Ok(())
        }

        async fn create_index(&self, index: &str, body: &Value) -> Result<(), HttpError> {
            let mut state = self.state.lock();
            if state.indices.contains_key(index) {
                return Err(rejected(
                    StatusCode::BAD_REQUEST,
                    format!("resource_already_exists_exception: {index}"),
                ));
            }
            state.creations.push(index.to_string());
            state.indices.insert(
                index.to_string(),
                StoredIndex {
                    body: body.clone(),
                    docs: BTreeMap::new(),
                },
            );
            Ok(())
        }

        async fn bulk(&self, target: &IndexTarget, body: &str) -> Result<BulkResponse, HttpError> {
            let operations = parse_operations(body)?;
            let mut state = self.state.lock();
            if let Some(fault) = state.bulk_faults.pop_front() {
                return Err(fault);
            }
            let index = state.indices.entry(target.name.clone()).or_default();
            for (id, source) in &operations {
                index.docs.insert(id.clone(), source.clone());
            }
            state.bulk_calls.push(BulkCall {
                target: target.clone(),
                operations,
            });
            Ok(BulkResponse::default())
        }
    }
}
