use crate::config::ParseConfig;
use crate::parser::annexes::is_annex_header;
use crate::parser::dom::Element;
use crate::parser::text::normalize_text;
use crate::types::Regulation;

fn is_doc_title(element: &Element) -> bool {
    element.is("p") && element.has_class("oj-doc-ti")
}

fn document_title(root: &Element) -> Option<String> {
    if let Some(main) = root.find_first(&|el| el.has_class("eli-main-title")) {
        let title = main
            .find_all(&is_doc_title)
            .into_iter()
            .map(|p| normalize_text(&p.text()))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !title.is_empty() {
            return Some(title);
        }
    }
    root.find_first(&|el| is_doc_title(el) && !is_annex_header(el))
        .map(|p| normalize_text(&p.text()))
        .filter(|text| !text.is_empty())
}

pub fn document_type(title: &str) -> &'static str {
    let first = title
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match first.as_str() {
        "directive" => "Directive",
        "decision" => "Decision",
        _ => "Regulation",
    }
}

pub fn extract_metadata(root: &Element, config: &ParseConfig) -> Regulation {
    let title = document_title(root).unwrap_or_else(|| config.regulation_name.clone());
    let celex_id = config.celex_id().unwrap_or_else(|| {
        tracing::debug!(
            "[Parser] No CELEX id in source_url, using regulation name {}",
            config.regulation_name
        );
        config.regulation_name.clone()
    });
    Regulation {
        celex_id,
        document_type: document_type(&title).to_string(),
        title,
        regulation_name: config.regulation_name.clone(),
        source_url: config.source_url.clone(),
        extracted_at: None,
    }
}
