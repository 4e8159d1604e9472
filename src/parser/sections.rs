//! Greedy state machine that turns a stream of annex fragments into sections.
//!
//! EUR-Lex numbering is not reliably nested, so the builder never backtracks:
//! each fragment attaches to the most recently active compatible section.

use crate::parser::markers::{classify, is_dash_marker, Marker};
use crate::types::{AnnexSection, AnnexSubsection, AnnexTable, ListType};

pub const DEFAULT_SECTION_ID: &str = "1";

#[derive(Debug, Clone, Default)]
struct SectionDraft {
    section_id: String,
    heading: String,
    items: Vec<String>,
    subsections: Vec<AnnexSubsection>,
    tables: Vec<AnnexTable>,
    dash_count: usize,
    letter_count: usize,
    ordered_count: usize,
}

impl SectionDraft {
    fn new(section_id: &str, heading: &str) -> Self {
        Self {
            section_id: section_id.to_string(),
            heading: heading.trim().to_string(),
            ..Self::default()
        }
    }

    fn merge_heading(&mut self, heading: &str) {
        let heading = heading.trim();
        if heading.is_empty() || self.heading.contains(heading) {
            return;
        }
        if self.heading.is_empty() || heading.contains(self.heading.as_str()) {
            self.heading = heading.to_string();
        } else {
            self.heading = format!("{} {}", self.heading, heading);
        }
    }

    fn list_type(&self) -> ListType {
        if self.dash_count > self.letter_count && self.dash_count > self.ordered_count {
            ListType::Dash
        } else if self.letter_count > self.dash_count && self.letter_count > self.ordered_count {
            ListType::Letter
        } else {
            ListType::Ordered
        }
    }

    fn finish(self) -> AnnexSection {
        let list_type = self.list_type();
        AnnexSection {
            section_id: self.section_id,
            heading: self.heading,
            list_type,
            items: self.items,
            subsections: self.subsections,
            tables: self.tables,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemStyle {
    Dash,
    Ordered,
    Unmarked,
}

/// Accumulates annex sections from fragments fed in document order.
///
/// The builder is reusable: [`SectionBuilder::flush`] hands back everything
/// built so far and leaves the builder empty for the next annex.
#[derive(Debug, Default)]
pub struct SectionBuilder {
    sections: Vec<SectionDraft>,
    current_section: Option<usize>,
    current_subsection: Option<usize>,
    pending_number: Option<String>,
}

impl SectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Classifies one line of text and attaches it to the current state.
    pub fn feed(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let line = match self.pending_number.take() {
            Some(number) => format!("{number}. {text}"),
            None => text.to_string(),
        };

        match classify(&line) {
            Marker::OrphanNumber { number } => {
                self.pending_number = Some(number);
            }
            Marker::SectionHeader { letter, heading } => {
                self.open_section(&letter, &heading);
            }
            Marker::Hierarchical {
                parent,
                child,
                content,
            } => {
                let section_id = format!("{parent}.{child}");
                match self.find_section(&section_id) {
                    Some(index) => {
                        self.current_section = Some(index);
                        self.current_subsection = None;
                        self.push_section_item(&content, ItemStyle::Ordered);
                    }
                    None => {
                        self.push_section(SectionDraft::new(&section_id, &content));
                    }
                }
            }
            Marker::Numbered { number, content } => {
                self.open_section(&number, &content);
            }
            Marker::Letter { letter, content } => {
                if self.reads_as_roman(&letter) {
                    self.push_nested_item(&content, ItemStyle::Ordered);
                } else {
                    self.push_subsection(&letter, &content);
                }
            }
            Marker::Roman { content, .. } => {
                self.push_nested_item(&content, ItemStyle::Ordered);
            }
            Marker::Dash { content } => {
                self.push_nested_item(&content, ItemStyle::Dash);
            }
            Marker::Plain { content } => {
                self.current_subsection = None;
                self.push_section_item(&content, ItemStyle::Unmarked);
            }
        }
    }

    /// Starts (or re-enters) the section keyed by `section_id`.
    ///
    /// Used for numbered lines, `Section X` headers and styled alphabetic
    /// headers alike, so a lettered top-level section and a numbered one share
    /// the same merge rules.
    pub fn open_section(&mut self, section_id: &str, heading: &str) {
        self.pending_number = None;
        match self.find_section(section_id) {
            Some(index) => {
                self.sections[index].merge_heading(heading);
                self.current_section = Some(index);
                self.current_subsection = None;
            }
            None => self.push_section(SectionDraft::new(section_id, heading)),
        }
    }

    pub fn feed_table(&mut self, table: AnnexTable) {
        let index = self.ensure_section();
        let section = &mut self.sections[index];
        if !section.tables.contains(&table) {
            section.tables.push(table);
        }
    }

    /// Returns the built sections with inferred list types and resets the builder.
    pub fn flush(&mut self) -> Vec<AnnexSection> {
        if let Some(number) = self.pending_number.take() {
            tracing::debug!("[Sections] Dropping orphan marker {number}. with no following text");
        }
        self.current_section = None;
        self.current_subsection = None;
        std::mem::take(&mut self.sections)
            .into_iter()
            .map(SectionDraft::finish)
            .collect()
    }

    fn find_section(&self, section_id: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.section_id == section_id)
    }

    fn push_section(&mut self, draft: SectionDraft) {
        self.sections.push(draft);
        self.current_section = Some(self.sections.len() - 1);
        self.current_subsection = None;
    }

    fn ensure_section(&mut self) -> usize {
        if let Some(index) = self.current_section {
            return index;
        }
        match self.find_section(DEFAULT_SECTION_ID) {
            Some(index) => {
                self.current_section = Some(index);
                index
            }
            None => {
                self.push_section(SectionDraft::new(DEFAULT_SECTION_ID, ""));
                self.sections.len() - 1
            }
        }
    }

    /// `(i)`, `(v)` and `(x)` are roman numerals unless they continue a lettered run.
    fn reads_as_roman(&self, letter: &str) -> bool {
        let predecessor = match letter {
            "i" => "h",
            "v" => "u",
            "x" => "w",
            _ => return false,
        };
        let current = self
            .current_section
            .zip(self.current_subsection)
            .map(|(section, sub)| self.sections[section].subsections[sub].subsection_id.as_str());
        current != Some(predecessor) && current != Some(letter)
    }

    fn push_subsection(&mut self, letter: &str, content: &str) {
        let section_index = self.ensure_section();
        let section = &mut self.sections[section_index];
        section.letter_count += 1;

        let existing = section
            .subsections
            .iter()
            .position(|sub| sub.subsection_id == letter);
        let sub_index = match existing {
            Some(index) => {
                let sub = &mut section.subsections[index];
                if is_valid_item(content) {
                    if sub.content.is_empty() {
                        sub.content = content.to_string();
                    } else if sub.content != content {
                        sub.items.push(content.to_string());
                    }
                }
                index
            }
            None => {
                let content = if is_valid_item(content) {
                    content.to_string()
                } else {
                    tracing::debug!("[Sections] ({letter}) carries no text, keeping it empty");
                    String::new()
                };
                section.subsections.push(AnnexSubsection {
                    subsection_id: letter.to_string(),
                    content,
                    items: Vec::new(),
                });
                section.subsections.len() - 1
            }
        };
        self.current_subsection = Some(sub_index);
    }

    /// Roman and dash items go under the open lettered subsection, else the section.
    fn push_nested_item(&mut self, content: &str, style: ItemStyle) {
        if !is_valid_item(content) {
            return;
        }
        let section_index = self.ensure_section();
        let Some(sub_index) = self.current_subsection else {
            self.push_section_item(content, style);
            return;
        };
        let section = &mut self.sections[section_index];
        count_style(section, style);
        section.subsections[sub_index].items.push(content.to_string());
    }

    fn push_section_item(&mut self, content: &str, style: ItemStyle) {
        if !is_valid_item(content) {
            return;
        }
        let section_index = self.ensure_section();
        let section = &mut self.sections[section_index];
        count_style(section, style);
        section.items.push(content.to_string());
    }
}

fn count_style(section: &mut SectionDraft, style: ItemStyle) {
    match style {
        ItemStyle::Dash => section.dash_count += 1,
        ItemStyle::Ordered => section.ordered_count += 1,
        ItemStyle::Unmarked => {}
    }
}

/// Items must carry text: not empty and not just a dash after trimming.
pub fn is_valid_item(content: &str) -> bool {
    let content = content.trim();
    !content.is_empty() && !is_dash_marker(content)
}
