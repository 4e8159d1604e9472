use crate::parser::dom::Element;
use crate::parser::text::normalize_text;
use crate::types::Recital;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static RECITAL_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((\d+)\)\s*(.*)$").unwrap());

fn is_recital_element(element: &Element) -> bool {
    element.is("div") && element.has_class("eli-subdivision") && element.id_starts_with("rct_")
}

fn parse_recital(element: &Element) -> Result<Recital, String> {
    let paragraphs = element
        .find_all(&|el| el.is("p") && el.has_class("oj-normal"))
        .into_iter()
        .map(|p| normalize_text(&p.text()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();
    let (first, rest) = paragraphs
        .split_first()
        .ok_or_else(|| "no text paragraphs".to_string())?;
    let caps = RECITAL_NUMBER_RE
        .captures(first)
        .ok_or_else(|| format!("missing (N) marker in {first:?}"))?;
    let recital_number = caps[1]
        .parse::<u32>()
        .map_err(|e| format!("bad recital number: {e}"))?;

    let mut parts = vec![caps[2].to_string()];
    parts.extend(rest.iter().cloned());
    let text = normalize_text(&parts.join(" "));
    if text.is_empty() {
        return Err(format!("recital ({recital_number}) has no text"));
    }
    Ok(Recital {
        recital_number,
        text,
    })
}

/// Numbered preamble clauses, sorted by number. Unreadable or repeated recitals are skipped.
pub fn extract_recitals(root: &Element) -> Vec<Recital> {
    let mut recitals = Vec::new();
    let mut seen = HashSet::new();
    for element in root.find_all(&is_recital_element) {
        match parse_recital(element) {
            Ok(recital) => {
                if seen.insert(recital.recital_number) {
                    recitals.push(recital);
                } else {
                    tracing::warn!(
                        "[Recital] Duplicate recital ({}), keeping the first",
                        recital.recital_number
                    );
                }
            }
            Err(e) => tracing::warn!(
                "[Recital] Skipping {}: {e}",
                element.id.as_deref().unwrap_or("recital")
            ),
        }
    }
    recitals.sort_by_key(|recital| recital.recital_number);
    recitals
}
