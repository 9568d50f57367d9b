//! Indexer configuration: optional TOML file, then `SNIPDEX_*` environment variables.

use std::path::PathBuf;

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use snipdex_http::HttpConfig;

use crate::{
    backend::{IndexTarget, DEFAULT_HOST},
    bulk::DEFAULT_BATCH_SIZE,
    error::{IndexerError, IndexerResult},
    schema::{IndexLayout, WipeScope, DOCUMENTS_INDEX, SNIPPETS_INDEX},
};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SNIPDEX_CONFIG";
const ENV_PREFIX: &str = "SNIPDEX";
const DEFAULT_PROGRESS_INTERVAL: usize = 1_000;

/// Mapping layout expected by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    /// Elasticsearch 7+: no mapping types.
    #[default]
    Typeless,
    /// Elasticsearch 6.x: `snippet` / `document` mapping types.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub hosts: Vec<String>,
    pub batch_size: usize,
    /// `None` sends all documents in one request.
    pub document_batch_size: Option<usize>,
    pub progress_interval: usize,
    pub snippets_index: String,
    pub documents_index: String,
    pub wipe_scope: WipeScope,
    pub mapping_type: MappingType,
    /// Directory of precomputed lemma files, laid out like the text corpus.
    pub lemma_dir: Option<PathBuf>,
    pub fail_on_item_errors: bool,
    pub http: HttpConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            hosts: vec![DEFAULT_HOST.to_string()],
            batch_size: DEFAULT_BATCH_SIZE,
            document_batch_size: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            snippets_index: SNIPPETS_INDEX.to_string(),
            documents_index: DOCUMENTS_INDEX.to_string(),
            wipe_scope: WipeScope::default(),
            mapping_type: MappingType::default(),
            lemma_dir: None,
            fail_on_item_errors: true,
            http: HttpConfig::bulk(),
        }
    }
}

impl IndexerConfig {
    pub fn validate(&self) -> IndexerResult<()> {
        if self.hosts.is_empty() {
            return Err(IndexerError::Config(
                "at least one backend host is required".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(IndexerError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.document_batch_size == Some(0) {
            return Err(IndexerError::Config(
                "document_batch_size must be greater than 0 when set".to_string(),
            ));
        }
        if self.snippets_index.is_empty() || self.documents_index.is_empty() {
            return Err(IndexerError::Config("index names must not be empty".to_string()));
        }
        if self.snippets_index == self.documents_index {
            return Err(IndexerError::Config(format!(
                "snippets and documents must use different indices, both are {:?}",
                self.snippets_index
            )));
        }
        Ok(())
    }

    pub fn layout(&self) -> IndexLayout {
        match self.mapping_type {
            MappingType::Typeless => IndexLayout {
                snippets: IndexTarget::new(&self.snippets_index),
                documents: IndexTarget::new(&self.documents_index),
            },
            MappingType::Legacy => IndexLayout::legacy(&self.snippets_index, &self.documents_index),
        }
    }
}

/// Loads [`IndexerConfig`] from a file and the environment.
pub struct ConfigLoader {
    config_path: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Uses `$SNIPDEX_CONFIG`, falling back to `<config dir>/snipdex/config.toml`.
    pub fn new() -> Self {
        let config_path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);
        Self {
            config_path,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snipdex")
            .join("config.toml")
    }

    /// The file is optional; environment variables override it
    /// (`SNIPDEX_BATCH_SIZE=200`, `SNIPDEX_HOSTS=http://a:9200,http://b:9200`).
    pub fn load(&self) -> IndexerResult<IndexerConfig> {
        let config = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("hosts"),
            )
            .build()?;
        let indexer_config: IndexerConfig = config.try_deserialize()?;
        indexer_config.validate()?;
        Ok(indexer_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_documented_values() {
        let config = IndexerConfig::default();
        assert_eq!(config.hosts, vec!["http://localhost:9200"]);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.document_batch_size, None);
        assert_eq!(config.wipe_scope, WipeScope::All);
        assert!(config.fail_on_item_errors);
        assert!(config.validate().is_ok());
        assert_eq!(config.layout(), IndexLayout::default());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = IndexerConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = IndexerConfig::default();
        config.document_batch_size = Some(0);
        assert!(config.validate().is_err());

        let mut config = IndexerConfig::default();
        config.documents_index = "snippets".to_string();
        assert!(config.validate().is_err());

        let mut config = IndexerConfig::default();
        config.hosts.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn legacy_mapping_type_sets_doc_types() {
        let config = IndexerConfig {
            mapping_type: MappingType::Legacy,
            ..Default::default()
        };
        let layout = config.layout();
        assert_eq!(layout.snippets.doc_type.as_deref(), Some("snippet"));
        assert_eq!(layout.documents.doc_type.as_deref(), Some("document"));
    }

    #[test]
    fn loads_toml_file_over_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
hosts = ["http://es-1:9200", "http://es-2:9200"]
batch_size = 250
wipe_scope = "managed"
mapping_type = "legacy"
lemma_dir = "/data/lemmas"

[http]
timeout = 5
"#,
        )
        .unwrap();

        let config = ConfigLoader::with_path(path)
            .with_env_prefix("SNIPDEX_FILE_TEST_UNSET")
            .load()
            .unwrap();
        assert_eq!(config.hosts, vec!["http://es-1:9200", "http://es-2:9200"]);
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.wipe_scope, WipeScope::Managed);
        assert_eq!(config.mapping_type, MappingType::Legacy);
        assert_eq!(config.lemma_dir, Some(PathBuf::from("/data/lemmas")));
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.progress_interval, 1_000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::with_path(dir.path().join("absent.toml"))
            .with_env_prefix("SNIPDEX_MISSING_TEST_UNSET")
            .load()
            .unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "batch_size = 250\n").unwrap();
        std::env::set_var("SNIPDEXENVTEST_BATCH_SIZE", "50");
        std::env::set_var("SNIPDEXENVTEST_HOSTS", "http://a:9200,http://b:9200");

        let config = ConfigLoader::with_path(path)
            .with_env_prefix("SNIPDEXENVTEST")
            .load()
            .unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.hosts, vec!["http://a:9200", "http://b:9200"]);
    }

    #[test]
    fn invalid_file_values_are_config_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "batch_size = 0\n").unwrap();
        let err = ConfigLoader::with_path(path)
            .with_env_prefix("SNIPDEX_INVALID_TEST_UNSET")
            .load()
            .unwrap_err();
        assert!(matches!(err, IndexerError::Config(_)));
    }
}
