use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use snipdex::{
    ConfigLoader, ElasticsearchBackend, IndexingPipeline, LemmaDirectory, SnippetSource,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snipdex")]
#[command(about = "Rebuild the snippets and documents indices from a snippet id list")]
struct Cli {
    /// File with one snippet identifier per line
    id_list: PathBuf,

    /// Root of the text tree (<documentId>/paragraph_<fragmentId>.txt)
    text_dir: PathBuf,

    /// Backend hosts, tried in order; overrides configured hosts
    hosts: Vec<String>,

    /// Config file (defaults to $SNIPDEX_CONFIG or the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let loader = match cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader
        .load()
        .with_context(|| format!("loading config from {}", loader.config_path().display()))?;
    if !cli.hosts.is_empty() {
        config.hosts = cli.hosts;
        config.validate()?;
    }

    let backend = ElasticsearchBackend::connect(&config.hosts, config.http.clone())?;
    info!(hosts = ?backend.hosts(), "connected backend client");

    let mut source = SnippetSource::new(&cli.id_list, &cli.text_dir);
    if let Some(lemma_dir) = &config.lemma_dir {
        source = source.with_lemmas(Arc::new(LemmaDirectory::new(lemma_dir)));
    }

    let pipeline = IndexingPipeline::from_config(Arc::new(backend), &config);
    match pipeline.run(&source).await {
        Ok(stats) => {
            info!(
                snippets = stats.snippets_indexed,
                documents = stats.documents_indexed,
                elapsed_s = stats.duration.as_secs_f64(),
                "index rebuilt"
            );
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "indexing failed");
            Err(err.into())
        }
    }
}
