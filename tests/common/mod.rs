#![allow(dead_code)]
use async_trait::async_trait;
use eurlex_ingest::ingest::StorageRecord;
use eurlex_ingest::runtime::types::RecordStore;
use eurlex_ingest::types::Document;
use eurlex_ingest::{parse_document, ParseConfig};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const GDPR_URL: &str =
    "https://eur-lex.europa.eu/legal-content/EN/TXT/HTML/?uri=CELEX:32016R0679";
pub const AI_ACT_URL: &str =
    "https://eur-lex.europa.eu/legal-content/EN/TXT/HTML/?uri=CELEX:32024R1689";

pub fn fixtures_dir() -> String {
    format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"))
}

pub fn load_fixture(filename: &str) -> String {
    let path = Path::new(&fixtures_dir()).join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

pub fn parse_fixture(filename: &str, config: &ParseConfig) -> Document {
    let html = load_fixture(filename);
    parse_document(&html, config)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {filename}: {e}"))
}

pub fn gdpr() -> Document {
    parse_fixture(
        "gdpr_excerpt.html",
        &ParseConfig::new("GDPR").with_source_url(GDPR_URL),
    )
}

pub fn ai_act() -> Document {
    parse_fixture(
        "ai_act_annexes.html",
        &ParseConfig::new("AI Act").with_source_url(AI_ACT_URL),
    )
}

#[derive(Clone)]
pub struct MockRecordStore {
    pub records: Arc<Mutex<Vec<StorageRecord>>>,
    pub existing: Arc<Mutex<HashSet<String>>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            existing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn with_existing(ids: &[&str]) -> Self {
        let store = Self::new();
        store
            .existing
            .lock()
            .unwrap()
            .extend(ids.iter().map(ToString::to_string));
        store
    }

    pub fn saved_ids(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|record| record.id.clone())
            .collect()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn exists(&self, id: &str) -> Result<bool, String> {
        Ok(self.existing.lock().unwrap().contains(id))
    }

    async fn save(&self, record: StorageRecord) -> Result<(), String> {
        self.existing.lock().unwrap().insert(record.id.clone());
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// Store whose writes always fail, for error propagation tests.
pub struct FailingRecordStore;

#[async_trait]
impl RecordStore for FailingRecordStore {
    async fn exists(&self, _id: &str) -> Result<bool, String> {
        Ok(false)
    }

    async fn save(&self, _record: StorageRecord) -> Result<(), String> {
        Err("disk full".to_string())
    }
}
