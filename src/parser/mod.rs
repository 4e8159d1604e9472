//! EUR-Lex HTML/XML parsing.
//!
//! [`parse_document`] runs the whole pipeline over one act: metadata,
//! recitals, chapters, articles, then annexes. Each stage walks the same
//! owned element tree built once by [`dom::parse_document_tree`].

pub mod annexes;
pub mod articles;
pub mod chapters;
pub mod dom;
pub mod markers;
pub mod metadata;
pub mod recitals;
pub mod sections;
pub mod tables;
pub mod text;

pub use markers::{classify, Marker, MarkerKind};
pub use sections::SectionBuilder;
pub use tables::extract_table;
pub use text::normalize_text;

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::types::Document;

/// Parses one legal act into a [`Document`].
///
/// Malformed fragments are logged and skipped. Duplicate annex or section
/// identifiers and empty annex items fail the whole document.
pub fn parse_document(html: &str, config: &ParseConfig) -> Result<Document, ParseError> {
    let root = dom::parse_document_tree(html).map_err(ParseError::Html)?;

    let metadata = metadata::extract_metadata(&root, config);
    let recitals = recitals::extract_recitals(&root);
    let chapters = chapters::extract_chapters(&root);
    let articles = articles::extract_articles(&root, config);
    let annexes = annexes::extract_annexes(&root, config)?;

    tracing::info!(
        "[Parser] {}: {} recitals, {} chapters, {} articles, {} annexes",
        metadata.celex_id,
        recitals.len(),
        chapters.len(),
        articles.len(),
        annexes.len()
    );

    Ok(Document {
        metadata,
        recitals,
        chapters,
        articles,
        annexes,
    })
}
