//! Owned element tree built from a `tl` parse.
//!
//! `tl` hands out flat node handles without parent links, which makes the
//! sibling walks the annex and article extractors rely on awkward. The tree
//! built here keeps only what those extractors read: tag name, classes, id,
//! inline style and decoded text. Elements hidden with an inline style are
//! collapsed into plain text while the tree is built, so later stages see the
//! full value EUR-Lex stores behind truncated displays.

use std::borrow::Cow;
use tl::{NodeHandle, Parser, VDom};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "caption", "dd", "div", "dl", "dt", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(Element),
    Text(String),
}

impl DomNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            DomNode::Element(element) => Some(element),
            DomNode::Text(_) => None,
        }
    }

    pub fn text(&self) -> String {
        match self {
            DomNode::Element(element) => element.text(),
            DomNode::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub style: Option<String>,
    pub children: Vec<DomNode>,
}

impl Element {
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_any_class(&self, classes: &[&str]) -> bool {
        classes.iter().any(|class| self.has_class(class))
    }

    pub fn id_starts_with(&self, prefix: &str) -> bool {
        self.id.as_deref().is_some_and(|id| id.starts_with(prefix))
    }

    pub fn is_block(&self) -> bool {
        BLOCK_TAGS.contains(&self.tag.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(DomNode::as_element)
    }

    pub fn has_block_children(&self) -> bool {
        self.child_elements().any(Element::is_block)
    }

    /// Text of the whole subtree, with a space at every block boundary.
    pub fn text(&self) -> String {
        let mut output = String::new();
        collect_text(self, &|_| false, &mut output);
        output
    }

    /// Like [`Element::text`], skipping descendants the predicate rejects.
    pub fn text_excluding(&self, skip: &dyn Fn(&Element) -> bool) -> String {
        let mut output = String::new();
        collect_text(self, skip, &mut output);
        output
    }

    /// Every descendant element (not `self`) matching the predicate, in document order.
    pub fn find_all<'a>(&'a self, predicate: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
        let mut found = Vec::new();
        find_into(self, predicate, &mut found);
        found
    }

    pub fn find_first<'a>(&'a self, predicate: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
        for child in self.child_elements() {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find_first(predicate) {
                return Some(found);
            }
        }
        None
    }

    /// Descendants matching the predicate without entering elements `stop` accepts.
    pub fn find_all_outside<'a>(
        &'a self,
        predicate: &dyn Fn(&Element) -> bool,
        stop: &dyn Fn(&Element) -> bool,
    ) -> Vec<&'a Element> {
        let mut found = Vec::new();
        for child in self.child_elements() {
            if predicate(child) {
                found.push(child);
            }
            if !stop(child) {
                found.extend(child.find_all_outside(predicate, stop));
            }
        }
        found
    }
}

fn collect_text(element: &Element, skip: &dyn Fn(&Element) -> bool, output: &mut String) {
    for child in &element.children {
        match child {
            DomNode::Text(text) => output.push_str(text),
            DomNode::Element(child) => {
                if skip(child) {
                    continue;
                }
                let block = child.is_block();
                if block {
                    output.push(' ');
                }
                collect_text(child, skip, output);
                if block {
                    output.push(' ');
                }
            }
        }
    }
}

fn find_into<'a>(
    element: &'a Element,
    predicate: &dyn Fn(&Element) -> bool,
    found: &mut Vec<&'a Element>,
) {
    for child in element.child_elements() {
        if predicate(child) {
            found.push(child);
        }
        find_into(child, predicate, found);
    }
}

pub fn parse_dom(html: &str) -> Result<VDom<'_>, String> {
    tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| format!("Failed to parse HTML document: {e}"))
}

/// Parses markup into an owned tree rooted at a synthetic `#document` element.
pub fn parse_document_tree(html: &str) -> Result<Element, String> {
    let dom = parse_dom(html)?;
    let parser = dom.parser();
    let mut root = Element {
        tag: "#document".to_string(),
        ..Element::default()
    };
    for handle in dom.children() {
        if let Some(node) = convert_node(*handle, parser) {
            root.children.push(node);
        }
    }
    Ok(root)
}

fn convert_node(handle: NodeHandle, parser: &Parser) -> Option<DomNode> {
    let node = handle.get(parser)?;

    if let Some(raw) = node.as_raw() {
        return Some(DomNode::Text(decode_entities(raw.as_utf8_str().as_ref()).into_owned()));
    }

    let tag = node.as_tag()?;
    let name = normalize_tag_name(tag.name().as_utf8_str().as_ref());
    if name.starts_with('?') || name.starts_with('!') || SKIPPED_TAGS.contains(&name.as_str()) {
        return None;
    }

    let attributes = tag.attributes();
    let style = attributes
        .get("style")
        .flatten()
        .map(|value| value.as_utf8_str().to_string());
    let mut element = Element {
        tag: name,
        id: attributes.id().map(|value| value.as_utf8_str().to_string()),
        classes: attributes
            .class()
            .map(|value| value.as_utf8_str())
            .unwrap_or_default()
            .split_whitespace()
            .map(ToString::to_string)
            .collect(),
        style,
        children: Vec::new(),
    };

    for child in tag.children().top().iter() {
        if let Some(converted) = convert_node(*child, parser) {
            element.children.push(converted);
        }
    }

    if element.style.as_deref().is_some_and(is_hidden_style) {
        return Some(DomNode::Text(element.text()));
    }

    Some(DomNode::Element(element))
}

fn normalize_tag_name(name: &str) -> String {
    let local = match name.find(':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    };
    local.to_ascii_lowercase()
}

pub fn is_hidden_style(style: &str) -> bool {
    let compact = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.contains("display:none") || compact.contains("visibility:hidden")
}

pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    match quick_xml::escape::unescape_with(raw, html_entity) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Owned(
            raw.replace("&nbsp;", "\u{00A0}")
                .replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&quot;", "\"")
                .replace("&amp;", "&"),
        ),
    }
}

fn html_entity(name: &str) -> Option<&'static str> {
    let value = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00A0}",
        "ensp" | "emsp" | "thinsp" => " ",
        "shy" | "zwsp" => "",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "laquo" => "\u{00AB}",
        "raquo" => "\u{00BB}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{00B7}",
        "sect" => "\u{00A7}",
        "para" => "\u{00B6}",
        "deg" => "\u{00B0}",
        "euro" => "\u{20AC}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "times" => "\u{00D7}",
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        _ => return None,
    };
    Some(value)
}
