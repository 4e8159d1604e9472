//! Annex extraction.
//!
//! Annex headers are found by style class, each header's content is the run
//! of sibling nodes up to the next header, and that content is expanded into
//! a flat fragment stream for [`SectionBuilder`]. Headers that repeat an
//! identifier (EUR-Lex sometimes splits one annex over several header blocks)
//! are merged into the annex built first.

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::parser::dom::{DomNode, Element};
use crate::parser::markers::{
    canonical_marker, classify, is_marker_cell, is_orphan_number, strip_marker, Marker,
};
use crate::parser::sections::{is_valid_item, SectionBuilder};
use crate::parser::tables::{cell_text, extract_table, row_cells, table_rows};
use crate::parser::text::{int_to_roman, normalize_text, word_count};
use crate::types::{Annex, AnnexSection, AnnexTable, TableParseMode};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

const HEADER_CLASSES: &[&str] = &["oj-doc-ti", "oj-ti-annex", "oj-doc-ti-annex"];
const MAX_NODE_DEPTH: usize = 24;
const MAX_SUBTITLE_NODES: usize = 3;

/// Descriptive headers that carry no numeral but always open a known annex.
const KEYWORD_ANNEX_IDS: &[(&str, &str)] = &[
    ("union harmonisation legislation", "I"),
    ("technical documentation referred to in article 11", "IV"),
    ("eu declaration of conformity", "V"),
];

static ANNEX_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bannex\b").unwrap());
static ANNEX_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?i:annex)\s+([IVXLC]+|[A-Z])\b").unwrap());
static ALPHA_SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])\.\s*(.*)$").unwrap());

fn is_main_title(element: &Element) -> bool {
    element.has_class("eli-main-title")
}

pub fn is_annex_header(element: &Element) -> bool {
    element.is("p")
        && element.has_any_class(HEADER_CLASSES)
        && ANNEX_WORD_RE.is_match(&element.text())
}

fn contains_annex_header(element: &Element) -> bool {
    is_annex_header(element) || element.find_first(&is_annex_header).is_some()
}

fn is_alpha_section_header(element: &Element) -> bool {
    element.has_class("oj-ti-grseq-1")
        && ALPHA_SECTION_RE.is_match(&normalize_text(&element.text()))
}

/// A discovered header plus the containers it sits in, innermost first.
struct HeaderSite<'a> {
    header: &'a Element,
    levels: Vec<(&'a Element, usize)>,
}

fn locate_headers<'a>(
    element: &'a Element,
    path: &mut Vec<(&'a Element, usize)>,
    sites: &mut Vec<HeaderSite<'a>>,
) {
    for (index, child) in element.children.iter().enumerate() {
        let DomNode::Element(child) = child else {
            continue;
        };
        if is_main_title(child) {
            continue;
        }
        path.push((element, index));
        if is_annex_header(child) {
            sites.push(HeaderSite {
                header: child,
                levels: path.iter().rev().copied().collect(),
            });
        } else {
            locate_headers(child, path, sites);
        }
        path.pop();
    }
}

/// Siblings after the header up to the next header. When the header is the
/// last thing in its container, the search continues one container up.
fn collect_content<'a>(site: &HeaderSite<'a>) -> Vec<&'a DomNode> {
    for &(container, index) in &site.levels {
        let mut nodes = Vec::new();
        let mut stopped = false;
        for node in &container.children[index + 1..] {
            match node {
                DomNode::Element(element) if contains_annex_header(element) => {
                    stopped = true;
                    break;
                }
                DomNode::Text(text) if text.trim().is_empty() => {}
                _ => nodes.push(node),
            }
        }
        if !nodes.is_empty() || stopped {
            return nodes;
        }
    }
    Vec::new()
}

/// Identifier and subtitle carried by the header line itself.
fn identify_header(text: &str, position: usize) -> (String, Option<String>) {
    if let Some(caps) = ANNEX_ID_RE.captures(text) {
        let id = caps[1].to_uppercase();
        let subtitle = clean_subtitle(&text[caps.get(0).map_or(0, |m| m.end())..]);
        return (id, subtitle);
    }

    let rest = ANNEX_WORD_RE
        .find(text)
        .map_or(text, |m| &text[m.end()..]);
    let subtitle = clean_subtitle(rest);
    let lower = text.to_lowercase();
    let id = KEYWORD_ANNEX_IDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, id)| id.to_string())
        .unwrap_or_else(|| int_to_roman(position as u32));
    (id, subtitle)
}

fn clean_subtitle(text: &str) -> Option<String> {
    let subtitle = text
        .trim()
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '\u{2014}' | '\u{2013}' | '-' | ':')
        })
        .to_string();
    if subtitle.is_empty() {
        None
    } else {
        Some(subtitle)
    }
}

/// Text that restates the annex subtitle: short, unmarked, not a lead-in or a sentence.
fn looks_like_subtitle(node: &DomNode) -> bool {
    if let DomNode::Element(element) = node {
        if element.is("table")
            || element.is("ul")
            || element.is("ol")
            || element.has_class("oj-ti-tbl")
            || is_alpha_section_header(element)
        {
            return false;
        }
    }
    let text = normalize_text(&node.text());
    let length = text.chars().count();
    (10..=200).contains(&length)
        && matches!(classify(&text), Marker::Plain { .. })
        && !text.ends_with([':', '.', ';'])
}

#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Text(String),
    SectionHeading { key: String, heading: String },
    Table(AnnexTable),
}

/// Every row is a marker cell followed by a content cell.
fn is_list_table(table: &Element) -> bool {
    let rows = table_rows(table);
    !rows.is_empty()
        && rows.iter().all(|row| {
            let cells = row_cells(row);
            cells.len() == 2 && is_marker_cell(&cell_text(cells[0]))
        })
}

fn expand_node(
    node: &DomNode,
    caption: &mut Option<String>,
    out: &mut Vec<Fragment>,
    depth: usize,
) -> Result<(), String> {
    match node {
        DomNode::Text(text) => {
            push_text(out, text);
            Ok(())
        }
        DomNode::Element(element) => expand_element(element, caption, out, depth),
    }
}

fn expand_element(
    element: &Element,
    caption: &mut Option<String>,
    out: &mut Vec<Fragment>,
    depth: usize,
) -> Result<(), String> {
    if depth > MAX_NODE_DEPTH {
        return Err(format!("nesting deeper than {MAX_NODE_DEPTH} levels"));
    }

    if element.is("table") {
        if is_list_table(element) {
            return expand_list_table(element, caption, out, depth);
        }
        out.push(Fragment::Table(extract_table(element, caption.take())));
        return Ok(());
    }

    if element.is("ul") || element.is("ol") {
        let bulleted = element.is("ul");
        for item in element.child_elements().filter(|el| el.is("li")) {
            let text = normalize_text(&item.text());
            if text.is_empty() {
                continue;
            }
            if bulleted && matches!(classify(&text), Marker::Plain { .. }) {
                out.push(Fragment::Text(format!("\u{2014} {text}")));
            } else {
                out.push(Fragment::Text(text));
            }
        }
        return Ok(());
    }

    if element.has_class("oj-ti-tbl") {
        let text = normalize_text(&element.text());
        if !text.is_empty() {
            *caption = Some(text);
        }
        return Ok(());
    }

    if is_alpha_section_header(element) {
        let text = normalize_text(&element.text());
        if let Some(caps) = ALPHA_SECTION_RE.captures(&text) {
            out.push(Fragment::SectionHeading {
                key: caps[1].to_string(),
                heading: caps[2]
                    .trim_matches(|c: char| {
                        c.is_whitespace() || matches!(c, '\'' | '"' | '\u{2018}' | '\u{2019}')
                    })
                    .to_string(),
            });
        }
        return Ok(());
    }

    if element.has_block_children() {
        for child in &element.children {
            expand_node(child, caption, out, depth + 1)?;
        }
        return Ok(());
    }

    push_text(out, &element.text());
    Ok(())
}

/// Re-emits each row as marker-prefixed text, then recurses into tables nested in the content cell.
fn expand_list_table(
    table: &Element,
    caption: &mut Option<String>,
    out: &mut Vec<Fragment>,
    depth: usize,
) -> Result<(), String> {
    for row in table_rows(table) {
        let cells = row_cells(row);
        let [marker, content] = cells.as_slice() else {
            continue;
        };
        let marker = canonical_marker(&cell_text(marker));
        let text = normalize_text(&content.text_excluding(&|el| el.is("table")));
        if !text.is_empty() {
            out.push(Fragment::Text(format!("{marker} {text}")));
        } else if is_orphan_number(&marker) {
            out.push(Fragment::Text(marker));
        }

        for nested in content.find_all_outside(&|el| el.is("table"), &|el| el.is("table")) {
            expand_element(nested, caption, out, depth + 1)?;
        }
    }
    Ok(())
}

fn push_text(out: &mut Vec<Fragment>, text: &str) {
    let text = normalize_text(text);
    if !text.is_empty() {
        out.push(Fragment::Text(text));
    }
}

/// Joins a bare numeric marker ("3.", "(12)") with the text fragment right after it,
/// spelled the way [`SectionBuilder::feed`] spells a pending number.
fn attach_orphan_numbers(fragments: Vec<Fragment>) -> Vec<Fragment> {
    let mut merged: Vec<Fragment> = Vec::with_capacity(fragments.len());
    let mut pending: Option<String> = None;
    for fragment in fragments {
        match (pending.take(), fragment) {
            (Some(marker), Fragment::Text(text)) if !is_orphan_number(&text) => {
                merged.push(Fragment::Text(format!("{}. {text}", strip_marker(&marker))));
            }
            (previous, Fragment::Text(text)) if is_orphan_number(&text) => {
                if let Some(previous) = previous {
                    merged.push(Fragment::Text(previous));
                }
                pending = Some(text);
            }
            (previous, fragment) => {
                if let Some(previous) = previous {
                    merged.push(Fragment::Text(previous));
                }
                merged.push(fragment);
            }
        }
    }
    if let Some(marker) = pending {
        merged.push(Fragment::Text(marker));
    }
    merged
}

struct AnnexPart {
    annex_id: String,
    subtitle: Option<String>,
    sections: Vec<AnnexSection>,
    source_words: usize,
}

fn build_part(site: &HeaderSite, position: usize, builder: &mut SectionBuilder) -> AnnexPart {
    let header_text = normalize_text(&site.header.text());
    let (annex_id, mut subtitle) = identify_header(&header_text, position);
    let mut nodes = collect_content(site);

    let source_words = nodes
        .iter()
        .map(|node| word_count(&normalize_text(&node.text())))
        .sum();

    let mut restated = 0;
    while restated < MAX_SUBTITLE_NODES
        && nodes.len() > restated + 1
        && looks_like_subtitle(nodes[restated])
    {
        restated += 1;
    }
    for node in nodes.drain(..restated) {
        if subtitle.is_none() {
            subtitle = Some(normalize_text(&node.text()));
        }
    }

    let mut caption = None;
    let mut fragments = Vec::new();
    for node in nodes {
        if let Err(e) = expand_node(node, &mut caption, &mut fragments, 0) {
            tracing::warn!("[Annex] ANNEX {annex_id}: skipping node: {e}");
        }
    }

    for fragment in attach_orphan_numbers(fragments) {
        match fragment {
            Fragment::Text(text) => builder.feed(&text),
            Fragment::SectionHeading { key, heading } => builder.open_section(&key, &heading),
            Fragment::Table(table) => builder.feed_table(table),
        }
    }

    AnnexPart {
        annex_id,
        subtitle,
        sections: builder.flush(),
        source_words,
    }
}

/// Unions `incoming` into `sections` by section id.
fn merge_sections(sections: &mut Vec<AnnexSection>, incoming: Vec<AnnexSection>) {
    for section in incoming {
        let Some(existing) = sections
            .iter_mut()
            .find(|existing| existing.section_id == section.section_id)
        else {
            sections.push(section);
            continue;
        };

        if existing.heading.is_empty() {
            existing.heading = section.heading;
        }
        for item in section.items {
            if !existing.items.contains(&item) {
                existing.items.push(item);
            }
        }
        for subsection in section.subsections {
            match existing
                .subsections
                .iter_mut()
                .find(|sub| sub.subsection_id == subsection.subsection_id)
            {
                Some(sub) => {
                    if sub.content.is_empty() {
                        sub.content = subsection.content;
                    }
                    for item in subsection.items {
                        if !sub.items.contains(&item) {
                            sub.items.push(item);
                        }
                    }
                }
                None => existing.subsections.push(subsection),
            }
        }
        for table in section.tables {
            if !existing.tables.contains(&table) {
                existing.tables.push(table);
            }
        }
    }
}

/// Finds, builds, merges and validates every annex in the document.
pub fn extract_annexes(root: &Element, config: &ParseConfig) -> Result<Vec<Annex>, ParseError> {
    let mut sites = Vec::new();
    locate_headers(root, &mut Vec::new(), &mut sites);
    tracing::debug!("[Annex] Found {} annex headers", sites.len());

    let mut builder = SectionBuilder::new();
    let mut annexes: Vec<Annex> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut source_words: HashMap<String, usize> = HashMap::new();

    for (position, site) in sites.iter().enumerate() {
        let part = build_part(site, position + 1, &mut builder);
        *source_words.entry(part.annex_id.clone()).or_default() += part.source_words;

        match by_id.get(&part.annex_id) {
            Some(&index) => {
                tracing::info!("[Annex] Merging repeated ANNEX {} fragment", part.annex_id);
                let annex = &mut annexes[index];
                if annex.subtitle.is_none() {
                    annex.subtitle = part.subtitle;
                }
                merge_sections(&mut annex.sections, part.sections);
            }
            None => {
                by_id.insert(part.annex_id.clone(), annexes.len());
                annexes.push(Annex {
                    title: format!("ANNEX {}", part.annex_id),
                    annex_id: part.annex_id,
                    subtitle: part.subtitle,
                    sections: part.sections,
                    order_index: annexes.len() as u32 + 1,
                });
            }
        }
    }

    for annex in &annexes {
        check_content_quality(annex, source_words.get(&annex.annex_id).copied(), config);
    }
    validate_annexes(&annexes)?;

    tracing::info!("[Annex] Extracted {} annexes", annexes.len());
    Ok(annexes)
}

fn check_content_quality(annex: &Annex, source_words: Option<usize>, config: &ParseConfig) {
    if !annex.sections.iter().any(AnnexSection::has_content) {
        tracing::warn!("[Annex] ANNEX {} has no section with content", annex.annex_id);
    }

    let Some(source_words) = source_words.filter(|words| *words > 0) else {
        return;
    };
    let ratio = extracted_word_count(annex) as f64 / source_words as f64;
    if ratio < config.word_ratio_threshold {
        tracing::warn!(
            "[Annex] ANNEX {}: word ratio {ratio:.2} below threshold {:.2}",
            annex.annex_id,
            config.word_ratio_threshold
        );
    }
}

pub fn extracted_word_count(annex: &Annex) -> usize {
    let mut count = annex.subtitle.as_deref().map_or(0, word_count);
    for section in &annex.sections {
        count += word_count(&section.heading);
        count += section.items.iter().map(|item| word_count(item)).sum::<usize>();
        for subsection in &section.subsections {
            count += word_count(&subsection.content);
            count += subsection.items.iter().map(|item| word_count(item)).sum::<usize>();
        }
        for table in &section.tables {
            count += table.caption.as_deref().map_or(0, word_count);
            if table.parse_mode == TableParseMode::Structured {
                count += table.columns.iter().map(|column| word_count(column)).sum::<usize>();
            }
            count += table
                .rows
                .iter()
                .flat_map(|row| row.values())
                .map(|value| word_count(value))
                .sum::<usize>();
        }
    }
    count
}

/// Structural checks that make a document unusable: duplicate ids and empty or dash-only items.
pub fn validate_annexes(annexes: &[Annex]) -> Result<(), ParseError> {
    let mut annex_ids = HashSet::new();
    for annex in annexes {
        if !annex_ids.insert(annex.annex_id.as_str()) {
            return Err(ParseError::DuplicateAnnex {
                annex_id: annex.annex_id.clone(),
            });
        }

        let mut section_ids = HashSet::new();
        for section in &annex.sections {
            if !section_ids.insert(section.section_id.as_str()) {
                return Err(ParseError::DuplicateSection {
                    annex_id: annex.annex_id.clone(),
                    section_id: section.section_id.clone(),
                });
            }

            let subsection_content = section
                .subsections
                .iter()
                .map(|sub| &sub.content)
                .filter(|content| !content.is_empty());
            let items = section
                .items
                .iter()
                .chain(subsection_content)
                .chain(section.subsections.iter().flat_map(|sub| sub.items.iter()));
            for item in items {
                if !is_valid_item(item) {
                    return Err(ParseError::InvalidItem {
                        annex_id: annex.annex_id.clone(),
                        section_id: section.section_id.clone(),
                        item: item.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnnexSubsection, ListType};

    #[test]
    fn identifies_explicit_keyword_and_positional_ids() {
        assert_eq!(
            identify_header("ANNEX III \u{2014} High-risk AI systems", 3),
            ("III".to_string(), Some("High-risk AI systems".to_string()))
        );
        assert_eq!(identify_header("ANNEX B", 1), ("B".to_string(), None));
        assert_eq!(
            identify_header("ANNEX Technical documentation referred to in Article 11(1)", 2).0,
            "IV"
        );
        assert_eq!(identify_header("ANNEX", 2), ("II".to_string(), None));
    }

    #[test]
    fn orphan_numbers_join_the_next_text() {
        let fragments = attach_orphan_numbers(vec![
            Fragment::Text("3.".to_string()),
            Fragment::Text("Biometrics".to_string()),
            Fragment::Text("4.".to_string()),
        ]);
        assert_eq!(
            fragments,
            vec![
                Fragment::Text("3. Biometrics".to_string()),
                Fragment::Text("4.".to_string()),
            ]
        );
    }

    #[test]
    fn parenthesised_orphan_opens_the_same_section_either_way() {
        let fragments = attach_orphan_numbers(vec![
            Fragment::Text("(12)".to_string()),
            Fragment::Text("Migration and border control".to_string()),
        ]);
        assert_eq!(
            fragments,
            vec![Fragment::Text("12. Migration and border control".to_string())]
        );

        let mut joined = SectionBuilder::new();
        for fragment in fragments {
            if let Fragment::Text(text) = fragment {
                joined.feed(&text);
            }
        }
        let mut pending = SectionBuilder::new();
        pending.feed("(12)");
        pending.feed("Migration and border control");

        let joined = joined.flush();
        assert_eq!(joined, pending.flush());
        assert_eq!(joined[0].section_id, "12");
    }

    #[test]
    fn merging_unions_items_without_duplicates() {
        let section = |items: &[&str]| AnnexSection {
            section_id: "1".to_string(),
            heading: String::new(),
            list_type: ListType::Dash,
            items: items.iter().map(ToString::to_string).collect(),
            subsections: Vec::new(),
            tables: Vec::new(),
        };
        let mut sections = vec![section(&["one", "two"])];
        merge_sections(&mut sections, vec![section(&["two", "three"])]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].items, vec!["one", "two", "three"]);
    }

    #[test]
    fn dash_only_item_is_a_hard_error() {
        let annex = Annex {
            annex_id: "I".to_string(),
            title: "ANNEX I".to_string(),
            subtitle: None,
            sections: vec![AnnexSection {
                section_id: "1".to_string(),
                heading: String::new(),
                list_type: ListType::Dash,
                items: vec![" \u{2014} ".to_string()],
                subsections: Vec::new(),
                tables: Vec::new(),
            }],
            order_index: 1,
        };
        assert!(matches!(
            validate_annexes(&[annex.clone()]),
            Err(ParseError::InvalidItem { .. })
        ));
        let mut dashed_point = annex.clone();
        dashed_point.sections[0].items = vec!["valid".to_string()];
        dashed_point.sections[0].subsections = vec![AnnexSubsection {
            subsection_id: "a".to_string(),
            content: "\u{2014}".to_string(),
            items: Vec::new(),
        }];
        assert!(matches!(
            validate_annexes(&[dashed_point]),
            Err(ParseError::InvalidItem { ref item, .. }) if item == "\u{2014}"
        ));

        let mut duplicate = annex.clone();
        duplicate.sections[0].items = vec!["valid".to_string()];
        assert!(matches!(
            validate_annexes(&[duplicate.clone(), duplicate]),
            Err(ParseError::DuplicateAnnex { .. })
        ));
    }
}
