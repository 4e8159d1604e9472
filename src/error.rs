use thiserror::Error;

/// Failures that abort parsing of a whole document.
///
/// Recoverable problems with a single fragment never surface here; they are
/// logged where they happen and the fragment contributes nothing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse document markup: {0}")]
    Html(String),

    #[error("duplicate annex identifier {annex_id}")]
    DuplicateAnnex { annex_id: String },

    #[error("duplicate section identifier {section_id} in ANNEX {annex_id}")]
    DuplicateSection {
        annex_id: String,
        section_id: String,
    },

    #[error("empty or dash-only item in ANNEX {annex_id}, section {section_id}: {item:?}")]
    InvalidItem {
        annex_id: String,
        section_id: String,
        item: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
