use async_trait::async_trait;
use eurlex_ingest::ingest::{ingest_document, StorageRecord};
use eurlex_ingest::runtime::fetcher::{is_remote_source, load_source, HttpFetcher};
use eurlex_ingest::runtime::types::RecordStore;
use eurlex_ingest::{parse_document, ParseConfig};
use std::collections::HashSet;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: eurlex-ingest <file-or-url> [config.json] [--records]";

/// Writes each record to stdout as one JSON line, once per id.
struct JsonLinesStore {
    seen: Mutex<HashSet<String>>,
}

#[async_trait]
impl RecordStore for JsonLinesStore {
    async fn exists(&self, id: &str) -> Result<bool, String> {
        let seen = self.seen.lock().map_err(|e| format!("Record index poisoned: {e}"))?;
        Ok(seen.contains(id))
    }

    async fn save(&self, record: StorageRecord) -> Result<(), String> {
        let line = serde_json::to_string(&record)
            .map_err(|e| format!("Failed to serialize record {}: {e}", record.id))?;
        println!("{line}");
        self.seen
            .lock()
            .map_err(|e| format!("Record index poisoned: {e}"))?
            .insert(record.id);
        Ok(())
    }
}

struct Args {
    source: String,
    config_path: Option<String>,
    records: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut records = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--records" => records = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    let source = positional.next().ok_or_else(|| USAGE.to_string())?;
    Ok(Args {
        source,
        config_path: positional.next(),
        records,
    })
}

fn default_config(source: &str) -> ParseConfig {
    if is_remote_source(source) {
        return ParseConfig::new(source).with_source_url(source);
    }
    let name = Path::new(source)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    ParseConfig::new(name)
}

async fn run() -> Result<(), String> {
    let args = parse_args()?;
    let mut config = match &args.config_path {
        Some(path) => ParseConfig::load_from_file(path).map_err(|e| e.to_string())?,
        None => default_config(&args.source),
    };
    if config.source_url.is_none() && is_remote_source(&args.source) {
        config.source_url = Some(args.source.clone());
    }

    let fetcher = HttpFetcher::with_defaults()?;
    let html = load_source(&fetcher, &args.source).await?;
    let mut document = parse_document(&html, &config).map_err(|e| e.to_string())?;
    document.metadata.extracted_at = Some(chrono::Utc::now().to_rfc3339());

    if args.records {
        let store = JsonLinesStore {
            seen: Mutex::new(HashSet::new()),
        };
        ingest_document(&document, &store).await?;
    } else {
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| format!("Failed to serialize document: {e}"))?;
        println!("{json}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("[Ingest] {err}");
            ExitCode::FAILURE
        }
    }
}
