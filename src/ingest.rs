use crate::runtime::types::RecordStore;
use crate::types::{Annex, AnnexSection, Article, ContentItem, Document};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Regulation,
    Recital,
    Chapter,
    Article,
    Paragraph,
    Chapeau,
    Subparagraph,
    Definition,
    Annex,
    AnnexSection,
    AnnexSubsection,
    AnnexItem,
    AnnexTable,
    AnnexTableRow,
}

/// One row for the persistence layer. `id` is a composite such as
/// `32016R0679-Art6-Para1-Sub_a`; `parent_id` points at the enclosing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub id: String,
    pub kind: RecordKind,
    pub parent_id: Option<String>,
    pub order_index: u32,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub inserted: usize,
    pub skipped: usize,
}

// ──────────────────────────────────────────────────────────────
// Flattening
// ──────────────────────────────────────────────────────────────

struct Flattener {
    celex_id: String,
    records: Vec<StorageRecord>,
}

impl Flattener {
    fn push(
        &mut self,
        id: String,
        kind: RecordKind,
        parent_id: Option<&str>,
        order_index: u32,
        payload: Value,
    ) {
        self.records.push(StorageRecord {
            id,
            kind,
            parent_id: parent_id.map(ToString::to_string),
            order_index,
            payload,
        });
    }

    fn article(&mut self, article: &Article, parent_id: &str) {
        let article_id = format!("{}-Art{}", self.celex_id, article.article_number);
        self.push(
            article_id.clone(),
            RecordKind::Article,
            Some(parent_id),
            article.order_index,
            json!({
                "article_number": article.article_number,
                "title": article.title,
                "is_definitions": article.is_definitions,
                "content_full": article.content_full,
            }),
        );

        for (ordinal, paragraph) in article.paragraphs.iter().enumerate() {
            let ordinal = ordinal as u32 + 1;
            let paragraph_key = paragraph
                .paragraph_number
                .clone()
                .unwrap_or_else(|| ordinal.to_string());
            let paragraph_id = format!("{article_id}-Para{paragraph_key}");
            self.push(
                paragraph_id.clone(),
                RecordKind::Paragraph,
                Some(&article_id),
                ordinal,
                json!({
                    "paragraph_number": paragraph.paragraph_number,
                    "content_full": paragraph.content_full,
                }),
            );

            let mut element_ids = HashMap::new();
            for item in &paragraph.ordered_contents {
                let (id, kind) = match item {
                    ContentItem::Chapeau { order_index, .. } => (
                        format!("{paragraph_id}-chapeau_{order_index}"),
                        RecordKind::Chapeau,
                    ),
                    ContentItem::Subparagraph { element_id, .. } => (
                        sub_id(&paragraph_id, element_id, &mut element_ids),
                        RecordKind::Subparagraph,
                    ),
                    ContentItem::Definition { element_id, .. } => (
                        sub_id(&paragraph_id, element_id, &mut element_ids),
                        RecordKind::Definition,
                    ),
                };
                self.push(
                    id,
                    kind,
                    Some(&paragraph_id),
                    item.order_index(),
                    json!({
                        "type": item.type_name(),
                        "element_id": item.element_id(),
                        "content": item.content(),
                    }),
                );
            }
        }
    }

    fn annex(&mut self, annex: &Annex) {
        let annex_id = format!("{}-Annex{}", self.celex_id, annex.annex_id);
        let celex_id = self.celex_id.clone();
        self.push(
            annex_id.clone(),
            RecordKind::Annex,
            Some(&celex_id),
            annex.order_index,
            json!({
                "annex_id": annex.annex_id,
                "title": annex.title,
                "subtitle": annex.subtitle,
            }),
        );
        for (ordinal, section) in annex.sections.iter().enumerate() {
            self.section(section, &annex_id, ordinal as u32 + 1);
        }
    }

    fn section(&mut self, section: &AnnexSection, annex_id: &str, order_index: u32) {
        let section_id = format!("{annex_id}-Sec{}", section.section_id);
        self.push(
            section_id.clone(),
            RecordKind::AnnexSection,
            Some(annex_id),
            order_index,
            json!({
                "section_id": section.section_id,
                "heading": section.heading,
                "list_type": section.list_type,
            }),
        );

        for (ordinal, item) in section.items.iter().enumerate() {
            let ordinal = ordinal as u32 + 1;
            self.push(
                format!("{section_id}-Item{ordinal}"),
                RecordKind::AnnexItem,
                Some(&section_id),
                ordinal,
                json!({ "content": item }),
            );
        }

        for (ordinal, subsection) in section.subsections.iter().enumerate() {
            let subsection_id = format!("{section_id}-Sub_{}", subsection.subsection_id);
            self.push(
                subsection_id.clone(),
                RecordKind::AnnexSubsection,
                Some(&section_id),
                ordinal as u32 + 1,
                json!({
                    "subsection_id": subsection.subsection_id,
                    "content": subsection.content,
                }),
            );
            for (item_ordinal, item) in subsection.items.iter().enumerate() {
                let item_ordinal = item_ordinal as u32 + 1;
                self.push(
                    format!("{subsection_id}-Item{item_ordinal}"),
                    RecordKind::AnnexItem,
                    Some(&subsection_id),
                    item_ordinal,
                    json!({ "content": item }),
                );
            }
        }

        for (ordinal, table) in section.tables.iter().enumerate() {
            let ordinal = ordinal as u32 + 1;
            let table_id = format!("{section_id}-Tab{ordinal}");
            self.push(
                table_id.clone(),
                RecordKind::AnnexTable,
                Some(&section_id),
                ordinal,
                json!({
                    "caption": table.caption,
                    "columns": table.columns,
                    "parse_mode": table.parse_mode,
                }),
            );
            for (row_ordinal, row) in table.rows.iter().enumerate() {
                let row_ordinal = row_ordinal as u32 + 1;
                self.push(
                    format!("{table_id}-Row{row_ordinal}"),
                    RecordKind::AnnexTableRow,
                    Some(&table_id),
                    row_ordinal,
                    json!(row),
                );
            }
        }
    }
}

/// Lettered runs can restart at (a) within one paragraph; repeats get `_2`, `_3`, ...
fn sub_id(paragraph_id: &str, element_id: &str, seen: &mut HashMap<String, u32>) -> String {
    let count = seen.entry(element_id.to_string()).or_default();
    *count += 1;
    match *count {
        1 => format!("{paragraph_id}-Sub_{element_id}"),
        n => format!("{paragraph_id}-Sub_{element_id}_{n}"),
    }
}

/// Flattens a parsed document into storage records, parents before children.
pub fn flatten_document(document: &Document) -> Vec<StorageRecord> {
    let celex_id = document.metadata.celex_id.clone();
    let mut flattener = Flattener {
        celex_id: celex_id.clone(),
        records: Vec::new(),
    };

    flattener.push(
        celex_id.clone(),
        RecordKind::Regulation,
        None,
        0,
        json!(document.metadata),
    );

    for recital in &document.recitals {
        flattener.push(
            format!("{celex_id}-Rec{}", recital.recital_number),
            RecordKind::Recital,
            Some(&celex_id),
            recital.recital_number,
            json!(recital),
        );
    }

    let mut chapter_of_article = HashMap::new();
    for chapter in &document.chapters {
        let chapter_id = format!("{celex_id}-Ch{}", chapter.chapter_number);
        for article_number in &chapter.article_numbers {
            chapter_of_article
                .entry(*article_number)
                .or_insert_with(|| chapter_id.clone());
        }
        flattener.push(
            chapter_id,
            RecordKind::Chapter,
            Some(&celex_id),
            chapter.order_index,
            json!({
                "chapter_number": chapter.chapter_number,
                "title": chapter.title,
            }),
        );
    }

    for article in &document.articles {
        let parent_id = chapter_of_article
            .get(&article.article_number)
            .cloned()
            .unwrap_or_else(|| celex_id.clone());
        flattener.article(article, &parent_id);
    }

    for annex in &document.annexes {
        flattener.annex(annex);
    }

    flattener.records
}

// ──────────────────────────────────────────────────────────────
// Persistence
// ──────────────────────────────────────────────────────────────

/// Saves every record of `document` once; ids already present in the store are skipped.
pub async fn ingest_document(
    document: &Document,
    store: &dyn RecordStore,
) -> Result<IngestSummary, String> {
    let mut summary = IngestSummary::default();
    for record in flatten_document(document) {
        if store.exists(&record.id).await? {
            tracing::debug!("[Ingest] Skipping existing record {}", record.id);
            summary.skipped += 1;
            continue;
        }
        let id = record.id.clone();
        store
            .save(record)
            .await
            .map_err(|e| format!("Failed to save record {id}: {e}"))?;
        summary.inserted += 1;
    }

    tracing::info!(
        "[Ingest] {}: inserted {} records, skipped {} existing",
        document.metadata.celex_id,
        summary.inserted,
        summary.skipped
    );
    Ok(summary)
}
