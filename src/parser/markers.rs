use crate::parser::text::is_roman_numeral;
use regex::Regex;
use std::sync::LazyLock;

static SECTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:section)\s+([A-Z])(?:\s*[.\u{2014}\u{2013}\-]\s*|\s+|$)(.*)$").unwrap()
});
static HIERARCHICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(\d+)\.\s+(\S.*)$").unwrap());
static ORPHAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)[.)]|\((\d+)\))$").unwrap());
static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[.)]\s*(\S.*)$").unwrap());
static LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([a-z])\)\s*(\S.*)$").unwrap());
static ROMAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([ivxlcdm]+)\)\s*(\S.*)$").unwrap());
static DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\u{2014}\u{2013}\-\u{2022}]\s*(.*)$").unwrap());
static MARKER_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\(\d+[a-z]?\)|\d+[a-z]?[.)]?|\([a-z]{1,2}\)|[a-z]\)|\([ivxlcdm]+\)|[\u{2014}\u{2013}\-\u{2022}])$",
    )
    .unwrap()
});

/// A line of annex or article text, classified by its leading list marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    SectionHeader { letter: String, heading: String },
    Hierarchical { parent: String, child: String, content: String },
    Numbered { number: String, content: String },
    Letter { letter: String, content: String },
    Roman { numeral: String, content: String },
    Dash { content: String },
    /// A bare numeric marker ("3.") with nothing after it.
    OrphanNumber { number: String },
    Plain { content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    SectionHeader,
    Hierarchical,
    Numbered,
    Letter,
    Roman,
    Dash,
    OrphanNumber,
    Plain,
}

impl Marker {
    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::SectionHeader { .. } => MarkerKind::SectionHeader,
            Marker::Hierarchical { .. } => MarkerKind::Hierarchical,
            Marker::Numbered { .. } => MarkerKind::Numbered,
            Marker::Letter { .. } => MarkerKind::Letter,
            Marker::Roman { .. } => MarkerKind::Roman,
            Marker::Dash { .. } => MarkerKind::Dash,
            Marker::OrphanNumber { .. } => MarkerKind::OrphanNumber,
            Marker::Plain { .. } => MarkerKind::Plain,
        }
    }
}

/// Classifies a line by trying each marker pattern in priority order.
///
/// Hierarchical numbering is tried before plain numbering so "1. 1. text"
/// is not read as item 1 with content "1. text".
pub fn classify(line: &str) -> Marker {
    let line = line.trim();

    if let Some(caps) = SECTION_HEADER_RE.captures(line) {
        return Marker::SectionHeader {
            letter: caps[1].to_string(),
            heading: caps[2].trim().to_string(),
        };
    }

    if let Some(caps) = HIERARCHICAL_RE.captures(line) {
        return Marker::Hierarchical {
            parent: caps[1].to_string(),
            child: caps[2].to_string(),
            content: caps[3].trim().to_string(),
        };
    }

    if let Some(caps) = ORPHAN_RE.captures(line) {
        let number = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        return Marker::OrphanNumber {
            number: number.unwrap_or_default().to_string(),
        };
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        return Marker::Numbered {
            number: caps[1].to_string(),
            content: caps[2].trim().to_string(),
        };
    }

    if let Some(caps) = LETTER_RE.captures(line) {
        return Marker::Letter {
            letter: caps[1].to_string(),
            content: caps[2].trim().to_string(),
        };
    }

    if let Some(caps) = ROMAN_RE.captures(line) {
        if is_roman_numeral(&caps[1]) {
            return Marker::Roman {
                numeral: caps[1].to_string(),
                content: caps[2].trim().to_string(),
            };
        }
    }

    if let Some(caps) = DASH_RE.captures(line) {
        return Marker::Dash {
            content: caps[1].trim().to_string(),
        };
    }

    Marker::Plain {
        content: line.to_string(),
    }
}

pub fn is_orphan_number(line: &str) -> bool {
    ORPHAN_RE.is_match(line.trim())
}

/// True when a table cell holds nothing but a list marker ("(a)", "1.", "—").
pub fn is_marker_cell(text: &str) -> bool {
    MARKER_CELL_RE.is_match(text.trim())
}

pub fn is_dash_marker(text: &str) -> bool {
    matches!(text.trim(), "\u{2014}" | "\u{2013}" | "-" | "\u{2022}")
}

/// "(a)" -> "a", "(12)" -> "12", "3." -> "3".
pub fn strip_marker(marker: &str) -> String {
    marker
        .trim()
        .trim_end_matches('.')
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim()
        .to_string()
}

/// Marker text suitable for re-feeding through [`classify`]: bare digits gain a dot.
pub fn canonical_marker(marker: &str) -> String {
    let marker = marker.trim();
    if !marker.is_empty() && marker.chars().all(|c| c.is_ascii_digit()) {
        format!("{marker}.")
    } else {
        marker.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_accepts_dot_and_parenthesis() {
        for (text, expected) in [
            ("1. First item", true),
            ("10. Tenth item", true),
            ("1) Alternative format", true),
            ("A. Letter format", false),
            ("(a) Letter format", false),
            ("(iv) Roman format", false),
            ("\u{2014} Dash format", false),
        ] {
            assert_eq!(
                classify(text).kind() == MarkerKind::Numbered,
                expected,
                "{text}"
            );
        }
    }

    #[test]
    fn letters_win_over_single_character_romans() {
        assert_eq!(
            classify("(i) first"),
            Marker::Letter {
                letter: "i".to_string(),
                content: "first".to_string()
            }
        );
        assert_eq!(
            classify("(iv) fourth"),
            Marker::Roman {
                numeral: "iv".to_string(),
                content: "fourth".to_string()
            }
        );
        assert_eq!(classify("(ab) text").kind(), MarkerKind::Plain);
    }

    #[test]
    fn dashes_and_bullets() {
        for text in ["\u{2014} Dash item", "- Hyphen item", "\u{2022} Bullet item"] {
            assert_eq!(classify(text).kind(), MarkerKind::Dash, "{text}");
        }
        assert_eq!(
            classify("\u{2014} first item"),
            Marker::Dash {
                content: "first item".to_string()
            }
        );
        assert_eq!(
            classify("\u{2014}"),
            Marker::Dash {
                content: String::new()
            }
        );
    }

    #[test]
    fn hierarchical_before_numbered() {
        assert_eq!(
            classify("1. 1. Nested clause text"),
            Marker::Hierarchical {
                parent: "1".to_string(),
                child: "1".to_string(),
                content: "Nested clause text".to_string()
            }
        );
        assert_eq!(classify("1. Simple numbered").kind(), MarkerKind::Numbered);
    }

    #[test]
    fn section_letter_headers() {
        assert_eq!(
            classify("Section A. List of Union harmonisation legislation"),
            Marker::SectionHeader {
                letter: "A".to_string(),
                heading: "List of Union harmonisation legislation".to_string()
            }
        );
        assert_eq!(
            classify("Section B \u{2014} Other"),
            Marker::SectionHeader {
                letter: "B".to_string(),
                heading: "Other".to_string()
            }
        );
        assert_eq!(classify("Sections apply").kind(), MarkerKind::Plain);
    }

    #[test]
    fn bare_numbers_are_orphans() {
        assert_eq!(
            classify("3."),
            Marker::OrphanNumber {
                number: "3".to_string()
            }
        );
        assert!(is_orphan_number("(12)"));
        assert!(!is_orphan_number("3. text"));
    }

    #[test]
    fn marker_cells() {
        for cell in ["(a)", "(12)", "1.", "4", "(iv)", "\u{2014}", "b)"] {
            assert!(is_marker_cell(cell), "{cell}");
        }
        for cell in ["Service", "(a) text", "2016/679"] {
            assert!(!is_marker_cell(cell), "{cell}");
        }
        assert_eq!(strip_marker("(a)"), "a");
        assert_eq!(strip_marker("12."), "12");
        assert_eq!(canonical_marker("4"), "4.");
    }
}
