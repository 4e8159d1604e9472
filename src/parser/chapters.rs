use crate::parser::articles::{article_number, is_article_element};
use crate::parser::dom::{DomNode, Element};
use crate::parser::text::{normalize_text, parse_designator_number};
use crate::types::Chapter;
use regex::Regex;
use std::sync::LazyLock;

static CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:chapter)\s+(\w+)").unwrap());

fn chapter_heading_number(element: &Element) -> Option<Result<u32, String>> {
    if !(element.is("p") && element.has_class("oj-ti-section-1")) {
        return None;
    }
    let text = normalize_text(&element.text());
    let caps = CHAPTER_RE.captures(&text)?;
    Some(parse_designator_number(&caps[1]).ok_or_else(|| format!("unreadable number in {text:?}")))
}

/// Title element right after a chapter heading: an `eli-title` block
/// (bold span preferred) or a second-level section heading.
fn chapter_title(siblings: &[DomNode]) -> String {
    let Some(next) = siblings.iter().find_map(DomNode::as_element) else {
        return String::new();
    };
    if next.is("div") && next.has_class("eli-title") {
        let title = next
            .find_first(&|el| el.is("span") && el.has_class("oj-bold"))
            .unwrap_or(next);
        return normalize_text(&title.text());
    }
    if next.is("p") && next.has_class("oj-ti-section-2") {
        return normalize_text(&next.text());
    }
    String::new()
}

#[derive(Default)]
struct ChapterScan {
    chapters: Vec<Chapter>,
    current: Option<usize>,
}

impl ChapterScan {
    fn walk(&mut self, element: &Element) {
        for (index, child) in element.children.iter().enumerate() {
            let DomNode::Element(child) = child else {
                continue;
            };

            if is_article_element(child) {
                self.add_article(child);
                continue;
            }

            match chapter_heading_number(child) {
                Some(Ok(number)) => {
                    let title = chapter_title(&element.children[index + 1..]);
                    self.open(number, title);
                }
                Some(Err(e)) => {
                    tracing::warn!("[Chapter] Skipping chapter heading: {e}");
                    self.current = None;
                }
                None => self.walk(child),
            }
        }
    }

    fn open(&mut self, number: u32, title: String) {
        match self
            .chapters
            .iter()
            .position(|chapter| chapter.chapter_number == number)
        {
            Some(index) => {
                tracing::warn!("[Chapter] Repeated CHAPTER {number}, merging");
                if self.chapters[index].title.is_empty() {
                    self.chapters[index].title = title;
                }
                self.current = Some(index);
            }
            None => {
                self.chapters.push(Chapter {
                    chapter_number: number,
                    title,
                    article_numbers: Vec::new(),
                    order_index: self.chapters.len() as u32 + 1,
                });
                self.current = Some(self.chapters.len() - 1);
            }
        }
    }

    fn add_article(&mut self, article: &Element) {
        let (Some(index), Some(number)) = (self.current, article_number(article)) else {
            return;
        };
        let members = &mut self.chapters[index].article_numbers;
        if !members.contains(&number) {
            members.push(number);
        }
    }
}

/// Chapters in document order with the articles that follow each heading.
pub fn extract_chapters(root: &Element) -> Vec<Chapter> {
    let mut scan = ChapterScan::default();
    scan.walk(root);
    tracing::debug!("[Chapter] Extracted {} chapters", scan.chapters.len());
    scan.chapters
}
