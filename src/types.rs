use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of one parsed legal act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: Regulation,
    pub recitals: Vec<Recital>,
    pub chapters: Vec<Chapter>,
    pub articles: Vec<Article>,
    pub annexes: Vec<Annex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    pub celex_id: String,
    pub title: String,
    pub document_type: String,
    pub regulation_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recital {
    pub recital_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_number: u32,
    pub title: String,
    pub article_numbers: Vec<u32>,
    pub order_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub article_number: u32,
    pub title: String,
    pub is_definitions: bool,
    pub paragraphs: Vec<Paragraph>,
    pub content_full: String,
    pub order_index: u32,
}

impl Article {
    pub fn new(
        article_number: u32,
        title: String,
        is_definitions: bool,
        paragraphs: Vec<Paragraph>,
    ) -> Self {
        let content_full = paragraphs
            .iter()
            .map(|paragraph| paragraph.content_full.as_str())
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            article_number,
            title,
            is_definitions,
            paragraphs,
            content_full,
            order_index: article_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub paragraph_number: Option<String>,
    pub ordered_contents: Vec<ContentItem>,
    pub content_full: String,
}

impl Paragraph {
    /// Builds a paragraph and derives `content_full` from its items.
    pub fn new(paragraph_number: Option<String>, ordered_contents: Vec<ContentItem>) -> Self {
        let content_full = render_content_full(&ordered_contents);
        Self {
            paragraph_number,
            ordered_contents,
            content_full,
        }
    }
}

/// Joins items in order: chapeaux verbatim, numbered items as `(<id>) <content>`.
pub fn render_content_full(items: &[ContentItem]) -> String {
    let mut ordered = items.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|item| item.order_index());
    ordered
        .into_iter()
        .map(ContentItem::rendered)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Chapeau {
        content: String,
        order_index: u32,
    },
    Subparagraph {
        element_id: String,
        content: String,
        order_index: u32,
    },
    Definition {
        element_id: String,
        content: String,
        order_index: u32,
    },
}

impl ContentItem {
    pub fn order_index(&self) -> u32 {
        match self {
            ContentItem::Chapeau { order_index, .. }
            | ContentItem::Subparagraph { order_index, .. }
            | ContentItem::Definition { order_index, .. } => *order_index,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ContentItem::Chapeau { content, .. }
            | ContentItem::Subparagraph { content, .. }
            | ContentItem::Definition { content, .. } => content,
        }
    }

    pub fn element_id(&self) -> Option<&str> {
        match self {
            ContentItem::Chapeau { .. } => None,
            ContentItem::Subparagraph { element_id, .. }
            | ContentItem::Definition { element_id, .. } => Some(element_id),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ContentItem::Chapeau { .. } => "chapeau",
            ContentItem::Subparagraph { .. } => "subparagraph",
            ContentItem::Definition { .. } => "definition",
        }
    }

    pub fn rendered(&self) -> String {
        match self.element_id() {
            Some(element_id) => format!("({element_id}) {}", self.content()),
            None => self.content().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annex {
    pub annex_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub sections: Vec<AnnexSection>,
    pub order_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Dash,
    Ordered,
    Letter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnexSection {
    pub section_id: String,
    pub heading: String,
    pub list_type: ListType,
    pub items: Vec<String>,
    pub subsections: Vec<AnnexSubsection>,
    pub tables: Vec<AnnexTable>,
}

impl AnnexSection {
    pub fn has_content(&self) -> bool {
        self.items.iter().any(|item| !item.trim().is_empty())
            || !self.subsections.is_empty()
            || self.tables.iter().any(|table| !table.rows.is_empty())
    }
}

/// A lettered sub-item of an annex section, with the roman/dash items nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnexSubsection {
    pub subsection_id: String,
    pub content: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableParseMode {
    Structured,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnexTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Column labels in source order; row maps are keyed by these.
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
    pub parse_mode: TableParseMode,
}
