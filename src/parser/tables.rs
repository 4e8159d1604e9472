use crate::parser::dom::Element;
use crate::parser::text::normalize_text;
use crate::types::{AnnexTable, TableParseMode};
use std::collections::{BTreeMap, HashSet};

/// Rows of `table`, looking through `thead`/`tbody`/`tfoot` but never into nested tables.
pub fn table_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        match child.tag.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child.child_elements().filter(|el| el.is("tr")));
            }
            _ => {}
        }
    }
    rows
}

pub fn row_cells(row: &Element) -> Vec<&Element> {
    row.child_elements()
        .filter(|el| el.is("td") || el.is("th"))
        .collect()
}

pub fn cell_text(cell: &Element) -> String {
    normalize_text(&cell.text())
}

/// Converts a table element into an [`AnnexTable`].
///
/// The first row is used as headers when every later row fits under it;
/// otherwise each cell is keyed by position (`col_0`, `col_1`, ...). The
/// table's own `<caption>` wins over `caption`, the text of the nearest
/// preceding caption-styled paragraph.
pub fn extract_table(table: &Element, caption: Option<String>) -> AnnexTable {
    let caption = own_caption(table)
        .or(caption)
        .filter(|caption| !caption.is_empty());
    let rows = table_rows(table)
        .into_iter()
        .map(|row| row_cells(row).into_iter().map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect::<Vec<_>>();

    match structured(&rows) {
        Some((columns, rows)) => AnnexTable {
            caption,
            columns,
            rows,
            parse_mode: TableParseMode::Structured,
        },
        None => {
            tracing::debug!(
                "[Table] Falling back to positional columns for {} rows{}",
                rows.len(),
                caption
                    .as_deref()
                    .map(|c| format!(" ({c})"))
                    .unwrap_or_default()
            );
            let (columns, rows) = fallback(&rows);
            AnnexTable {
                caption,
                columns,
                rows,
                parse_mode: TableParseMode::Fallback,
            }
        }
    }
}

fn own_caption(table: &Element) -> Option<String> {
    table
        .child_elements()
        .find(|el| el.is("caption"))
        .map(|caption| normalize_text(&caption.text()))
}

type Rows = Vec<BTreeMap<String, String>>;

fn structured(rows: &[Vec<String>]) -> Option<(Vec<String>, Rows)> {
    let (header, body) = rows.split_first()?;
    if body.is_empty() || header.iter().all(String::is_empty) {
        return None;
    }
    if body.iter().any(|row| row.len() > header.len()) {
        return None;
    }

    let columns = header_labels(header);
    let rows = body
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    (column.clone(), row.get(index).cloned().unwrap_or_default())
                })
                .collect()
        })
        .collect();
    Some((columns, rows))
}

/// Empty labels become positional, repeated labels get a numeric suffix.
fn header_labels(header: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let base = if label.is_empty() {
                format!("col_{index}")
            } else {
                label.clone()
            };
            let mut candidate = base.clone();
            let mut suffix = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}

fn fallback(rows: &[Vec<String>]) -> (Vec<String>, Rows) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let columns = (0..width).map(|index| format!("col_{index}")).collect();
    let rows = rows
        .iter()
        .map(|cells| {
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| (format!("col_{index}"), cell.clone()))
                .collect()
        })
        .collect();
    (columns, rows)
}
