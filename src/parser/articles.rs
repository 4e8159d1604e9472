use crate::config::ParseConfig;
use crate::parser::dom::{DomNode, Element};
use crate::parser::markers::{is_dash_marker, is_marker_cell, strip_marker};
use crate::parser::tables::{cell_text, row_cells, table_rows};
use crate::parser::text::normalize_text;
use crate::types::{Article, ContentItem, Paragraph};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static ARTICLE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^article\s+(\d+)\b").unwrap());
static PARAGRAPH_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*").unwrap());

const MAX_FRAGMENT_DEPTH: usize = 16;

pub fn is_article_element(element: &Element) -> bool {
    element.is("div") && element.has_class("eli-subdivision") && element.id_starts_with("art_")
}

fn is_title_element(element: &Element) -> bool {
    (element.is("p") && element.has_any_class(&["oj-ti-art", "oj-sti-art"]))
        || (element.is("div") && element.has_class("eli-title"))
}

/// True iff the title mentions "definition" in any case.
pub fn is_definitions_title(title: &str) -> bool {
    title.to_lowercase().contains("definition")
}

/// Number from the `oj-ti-art` heading ("Article 4"), if it parses.
pub fn article_number(element: &Element) -> Option<u32> {
    let heading = element.find_first(&|el| el.is("p") && el.has_class("oj-ti-art"))?;
    let text = normalize_text(&heading.text());
    ARTICLE_NUMBER_RE.captures(&text)?[1].parse().ok()
}

fn article_title(element: &Element) -> String {
    element
        .find_first(&|el| el.is("p") && el.has_class("oj-sti-art"))
        .map(|title| normalize_text(&title.text()))
        .unwrap_or_default()
}

/// Finds every article in the document, parses it, and returns them by number.
pub fn extract_articles(root: &Element, config: &ParseConfig) -> Vec<Article> {
    let mut articles = Vec::new();
    let mut seen = HashSet::new();

    for element in root.find_all(&is_article_element) {
        let Some(number) = article_number(element) else {
            tracing::warn!(
                "[Article] Skipping {}: no parseable article number",
                element.id.as_deref().unwrap_or("article")
            );
            continue;
        };
        if !seen.insert(number) {
            tracing::warn!("[Article] Duplicate Article {number}, keeping the first occurrence");
            continue;
        }

        let title = article_title(element);
        let is_definitions = is_definitions_title(&title);
        let configured = config.is_configured_definition_article(number);
        if is_definitions && !configured {
            tracing::warn!(
                "[Article] Article {number} ({title}) reads as definitions but is not in definition_article_numbers"
            );
        } else if configured && !is_definitions {
            tracing::debug!(
                "[Article] Article {number} is configured as definitions but titled {title:?}"
            );
        }

        let paragraphs = parse_paragraphs(element, number, is_definitions);
        tracing::debug!(
            "[Article] Article {number}: {} paragraphs{}",
            paragraphs.len(),
            if is_definitions { " (definitions)" } else { "" }
        );
        articles.push(Article::new(number, title, is_definitions, paragraphs));
    }

    articles.sort_by_key(|article| article.article_number);
    articles
}

/// Splits one article body into paragraphs.
pub fn parse_paragraphs(
    article: &Element,
    article_number: u32,
    is_definitions: bool,
) -> Vec<Paragraph> {
    let fragments = article
        .child_elements()
        .filter(|el| el.is("div") || el.is("p") || el.is("table"))
        .filter(|el| !is_title_element(el))
        .collect::<Vec<_>>();

    if is_definitions {
        if let Some(paragraph) = read_definitions(article_number, &fragments) {
            return vec![paragraph];
        }
        tracing::debug!(
            "[Article] Article {article_number}: no definition table, reading as regular article"
        );
    }

    if fragments.iter().any(|fragment| paragraph_number(fragment).is_some()) {
        read_numbered(article_number, &fragments, is_definitions)
    } else {
        read_unnumbered(article_number, &fragments)
    }
}

fn paragraph_number(fragment: &Element) -> Option<String> {
    if fragment.is("table") {
        return None;
    }
    let text = normalize_text(&fragment.text());
    PARAGRAPH_NUMBER_RE
        .captures(&text)
        .map(|caps| caps[1].to_string())
}

fn read_definitions(article_number: u32, fragments: &[&Element]) -> Option<Paragraph> {
    let blocks = if fragments.iter().any(|fragment| fragment.is("table")) {
        fragments.to_vec()
    } else {
        let nested = fragments
            .iter()
            .flat_map(|fragment| {
                if fragment.is("div") {
                    fragment.child_elements().collect::<Vec<_>>()
                } else {
                    vec![*fragment]
                }
            })
            .collect::<Vec<_>>();
        if !nested.iter().any(|el| el.is("table")) {
            return None;
        }
        nested
    };

    let mut draft = ParagraphDraft::new(Some("1".to_string()), true);
    for block in blocks {
        match read_fragment(block, false) {
            Ok(pieces) => draft.extend(pieces),
            Err(e) => tracing::warn!(
                "[Article] Article {article_number}: skipping definitions block: {e}"
            ),
        }
    }
    Some(draft.finish())
}

fn read_numbered(
    article_number: u32,
    fragments: &[&Element],
    definitions: bool,
) -> Vec<Paragraph> {
    let mut drafts: Vec<ParagraphDraft> = Vec::new();
    let mut current = None;

    for fragment in fragments {
        let number = paragraph_number(fragment);
        if let Some(number) = &number {
            let existing = drafts
                .iter()
                .position(|draft| draft.number.as_deref() == Some(number.as_str()));
            current = Some(match existing {
                Some(index) => {
                    tracing::debug!(
                        "[Article] Article {article_number}: merging repeated paragraph {number}"
                    );
                    index
                }
                None => {
                    drafts.push(ParagraphDraft::new(Some(number.clone()), definitions));
                    drafts.len() - 1
                }
            });
        }

        let Some(index) = current else {
            tracing::debug!(
                "[Article] Article {article_number}: skipping prose before the first numbered paragraph"
            );
            continue;
        };

        match read_fragment(fragment, number.is_some()) {
            Ok(pieces) => drafts[index].extend(pieces),
            Err(e) => tracing::warn!(
                "[Article] Article {article_number}, paragraph {}: skipping fragment: {e}",
                drafts[index].number.as_deref().unwrap_or("?")
            ),
        }
    }

    drafts
        .into_iter()
        .map(ParagraphDraft::finish)
        .filter(|paragraph| !paragraph.ordered_contents.is_empty())
        .collect()
}

/// The whole body becomes one unnumbered paragraph with a single chapeau.
fn read_unnumbered(article_number: u32, fragments: &[&Element]) -> Vec<Paragraph> {
    let mut lines = Vec::new();
    for fragment in fragments {
        match read_fragment(fragment, false) {
            Ok(pieces) => lines.extend(pieces.into_iter().map(|piece| piece.rendered())),
            Err(e) => tracing::warn!("[Article] Article {article_number}: skipping fragment: {e}"),
        }
    }
    lines.retain(|line| !line.is_empty());
    if lines.is_empty() {
        return Vec::new();
    }
    vec![Paragraph::new(
        None,
        vec![ContentItem::Chapeau {
            content: lines.join("\n"),
            order_index: 1,
        }],
    )]
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Chapeau(String),
    Item { id: String, content: String },
}

impl Piece {
    fn rendered(&self) -> String {
        match self {
            Piece::Chapeau(content) => content.clone(),
            Piece::Item { id, content } => format!("({id}) {content}"),
        }
    }
}

#[derive(Debug)]
struct ParagraphDraft {
    number: Option<String>,
    definitions: bool,
    items: Vec<ContentItem>,
    seen: HashSet<String>,
}

impl ParagraphDraft {
    fn new(number: Option<String>, definitions: bool) -> Self {
        Self {
            number,
            definitions,
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn extend(&mut self, pieces: Vec<Piece>) {
        for piece in pieces {
            self.push(piece);
        }
    }

    fn push(&mut self, piece: Piece) {
        let key = piece.rendered();
        if key.is_empty() || !self.seen.insert(key) {
            return;
        }
        let order_index = self.items.len() as u32 + 1;
        let item = match piece {
            Piece::Chapeau(content) => ContentItem::Chapeau {
                content,
                order_index,
            },
            Piece::Item { id, content } if self.definitions => ContentItem::Definition {
                element_id: id,
                content,
                order_index,
            },
            Piece::Item { id, content } => ContentItem::Subparagraph {
                element_id: id,
                content,
                order_index,
            },
        };
        self.items.push(item);
    }

    fn finish(self) -> Paragraph {
        Paragraph::new(self.number, self.items)
    }
}

/// Reads one body fragment into chapeaux and numbered items, in document order.
fn read_fragment(element: &Element, strip_number: bool) -> Result<Vec<Piece>, String> {
    let mut reader = FragmentReader {
        strip_number,
        pieces: Vec::new(),
        inline: String::new(),
    };
    reader.read(element, 0)?;
    reader.flush_inline();
    Ok(reader.pieces)
}

struct FragmentReader {
    strip_number: bool,
    pieces: Vec<Piece>,
    inline: String,
}

impl FragmentReader {
    fn read(&mut self, element: &Element, depth: usize) -> Result<(), String> {
        if depth > MAX_FRAGMENT_DEPTH {
            return Err(format!("nesting deeper than {MAX_FRAGMENT_DEPTH} levels"));
        }

        if element.is("table") {
            self.flush_inline();
            for piece in table_pieces(element) {
                self.push(piece);
            }
            return Ok(());
        }

        if !element.has_block_children() {
            if element.is_block() {
                self.flush_inline();
                self.push_text(&element.text());
            } else {
                self.inline.push_str(&element.text());
            }
            return Ok(());
        }

        for child in &element.children {
            match child {
                DomNode::Text(text) => self.inline.push_str(text),
                DomNode::Element(child) if child.is_block() || child.has_block_children() => {
                    self.flush_inline();
                    self.read(child, depth + 1)?;
                }
                DomNode::Element(child) => self.inline.push_str(&child.text()),
            }
        }
        self.flush_inline();
        Ok(())
    }

    fn flush_inline(&mut self) {
        if self.inline.trim().is_empty() {
            self.inline.clear();
            return;
        }
        let text = std::mem::take(&mut self.inline);
        self.push_text(&text);
    }

    fn push_text(&mut self, text: &str) {
        let mut text = normalize_text(text);
        if self.strip_number {
            self.strip_number = false;
            if let Some(found) = PARAGRAPH_NUMBER_RE.find(&text) {
                text = text[found.end()..].to_string();
            }
        }
        if !text.is_empty() {
            self.pieces.push(Piece::Chapeau(text));
        }
    }

    fn push(&mut self, piece: Piece) {
        self.strip_number = false;
        self.pieces.push(piece);
    }
}

/// Marker rows become numbered items, dash rows dashed chapeaux, other rows plain chapeaux.
/// Nested tables stay folded into the text of the cell that holds them. A marker
/// row with an empty content cell is dropped on its own.
fn table_pieces(table: &Element) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for row in table_rows(table) {
        let cells = row_cells(row);
        let Some((first, rest)) = cells.split_first() else {
            continue;
        };
        let marker = cell_text(first);
        let rest_text = normalize_text(
            &rest
                .iter()
                .map(|cell| cell.text())
                .collect::<Vec<_>>()
                .join(" "),
        );

        if rest.is_empty() || !is_marker_cell(&marker) {
            let text = normalize_text(&format!("{marker} {rest_text}"));
            if !text.is_empty() {
                pieces.push(Piece::Chapeau(text));
            }
        } else if is_dash_marker(&marker) {
            if !rest_text.is_empty() {
                pieces.push(Piece::Chapeau(format!("\u{2014} {rest_text}")));
            }
        } else if rest_text.is_empty() {
            tracing::warn!("[Article] Skipping item {marker}: no content");
        } else {
            pieces.push(Piece::Item {
                id: strip_marker(&marker),
                content: rest_text,
            });
        }
    }
    pieces
}
