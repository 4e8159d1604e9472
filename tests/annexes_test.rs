mod common;

use common::{ai_act, parse_fixture};
use eurlex_ingest::parser::annexes::extracted_word_count;
use eurlex_ingest::types::{Annex, AnnexSection, ListType, TableParseMode};
use eurlex_ingest::ParseConfig;
use std::collections::HashSet;

fn annex<'a>(annexes: &'a [Annex], annex_id: &str) -> &'a Annex {
    annexes
        .iter()
        .find(|annex| annex.annex_id == annex_id)
        .unwrap_or_else(|| panic!("ANNEX {annex_id} missing"))
}

fn section<'a>(annex: &'a Annex, section_id: &str) -> &'a AnnexSection {
    annex
        .sections
        .iter()
        .find(|section| section.section_id == section_id)
        .unwrap_or_else(|| panic!("section {section_id} missing from ANNEX {}", annex.annex_id))
}

#[test]
fn annex_ids_are_unique_and_in_document_order() {
    let document = ai_act();
    let ids: Vec<&str> = document.annexes.iter().map(|a| a.annex_id.as_str()).collect();
    assert_eq!(ids, vec!["I", "III", "IV"]);
    for (index, annex) in document.annexes.iter().enumerate() {
        assert_eq!(annex.order_index, index as u32 + 1);
        assert_eq!(annex.title, format!("ANNEX {}", annex.annex_id));
    }
}

#[test]
fn section_ids_are_unique_and_items_carry_text() {
    let document = ai_act();
    for annex in &document.annexes {
        let mut seen = HashSet::new();
        for section in &annex.sections {
            assert!(seen.insert(section.section_id.as_str()), "{}", section.section_id);
            let items = section
                .items
                .iter()
                .chain(section.subsections.iter().flat_map(|sub| sub.items.iter()));
            for item in items {
                assert!(!item.trim().is_empty());
                assert_ne!(item.trim(), "\u{2014}");
            }
        }
    }
}

#[test]
fn repeated_annex_header_merges_into_first() {
    let document = ai_act();
    let annex_i = annex(&document.annexes, "I");
    assert_eq!(
        annex_i.subtitle.as_deref(),
        Some("List of Union harmonisation legislation")
    );

    let ids: Vec<&str> = annex_i.sections.iter().map(|s| s.section_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    let section_b = section(annex_i, "B");
    assert_eq!(section_b.heading, "List of other Union harmonisation legislation");
    assert_eq!(section_b.items.len(), 2);
    assert!(section_b.items[0].starts_with("Regulation (EC) No 300/2008"));
    assert!(section_b.items[1].starts_with("Regulation (EU) No 168/2013"));
}

#[test]
fn section_letter_headers_collect_dash_rows() {
    let document = ai_act();
    let section_a = section(annex(&document.annexes, "I"), "A");
    assert!(section_a.heading.starts_with("List of Union harmonisation legislation based on"));
    assert_eq!(section_a.items.len(), 2);
    assert!(section_a.items[0].starts_with("Directive 2006/42/EC"));
    assert_eq!(section_a.list_type, ListType::Dash);
}

#[test]
fn nested_list_tables_become_lettered_subsections() {
    let document = ai_act();
    let annex_iii = annex(&document.annexes, "III");
    assert!(annex_iii
        .subtitle
        .as_deref()
        .is_some_and(|subtitle| subtitle.starts_with("High-risk AI systems referred to in Article 6")));

    let biometrics = section(annex_iii, "1");
    assert!(biometrics.heading.starts_with("Biometrics"));
    let letters: Vec<&str> = biometrics
        .subsections
        .iter()
        .map(|sub| sub.subsection_id.as_str())
        .collect();
    assert_eq!(letters, vec!["a", "b"]);
    assert_eq!(
        biometrics.subsections[0].content,
        "remote biometric identification systems;"
    );
    assert!(biometrics.subsections[1]
        .content
        .contains("according to sensitive or protected attributes"));
    assert_eq!(biometrics.list_type, ListType::Letter);

    let infrastructure = section(annex_iii, "2");
    assert!(infrastructure.heading.starts_with("Critical infrastructure"));
}

#[test]
fn orphan_number_paragraph_opens_its_section() {
    let document = ai_act();
    let education = section(annex(&document.annexes, "III"), "3");
    assert_eq!(education.heading, "Education and vocational training:");
    assert_eq!(education.items.len(), 2);
    assert!(education.items[0].starts_with("AI systems intended to be used to determine access"));
    assert_eq!(education.list_type, ListType::Dash);
}

#[test]
fn keyword_header_resolves_known_annex() {
    let document = ai_act();
    let annex_iv = annex(&document.annexes, "IV");
    assert!(annex_iv
        .subtitle
        .as_deref()
        .is_some_and(|subtitle| subtitle.starts_with("Technical documentation referred to in Article 11")));
    let ids: Vec<&str> = annex_iv.sections.iter().map(|s| s.section_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(section(annex_iv, "2").heading.starts_with("A detailed description"));
}

#[test]
fn unnumbered_annex_takes_its_position_and_styled_sections() {
    let document = parse_fixture("dma_annex.html", &ParseConfig::new("DMA"));
    assert_eq!(document.annexes.len(), 1);

    let annex = &document.annexes[0];
    assert_eq!(annex.annex_id, "I");
    assert_eq!(
        annex.subtitle.as_deref(),
        Some("METHODOLOGY FOR IDENTIFYING AND CALCULATING ACTIVE END USERS AND ACTIVE BUSINESS USERS")
    );

    let ids: Vec<&str> = annex.sections.iter().map(|s| s.section_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    let general = section(annex, "A");
    assert_eq!(general.heading, "General");
    assert_eq!(general.items.len(), 1);
    assert!(general.items[0].starts_with("This Annex aims at specifying a methodology"));
}

#[test]
fn regular_table_is_structured_under_its_caption() {
    let document = parse_fixture("dma_annex.html", &ParseConfig::new("DMA"));
    let active_users = section(&document.annexes[0], "B");
    assert_eq!(active_users.heading, "Active end users");
    assert_eq!(active_users.tables.len(), 1);

    let table = &active_users.tables[0];
    assert_eq!(table.parse_mode, TableParseMode::Structured);
    assert_eq!(table.caption.as_deref(), Some("Indicators by core platform service"));
    assert_eq!(
        table.columns,
        vec!["Core platform service", "Active end users", "Active business users"]
    );
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0]["Core platform service"], "Online intermediation services");
    assert_eq!(table.rows[1]["Active business users"], "");
}

#[test]
fn irregular_table_falls_back_to_positional_columns() {
    let document = parse_fixture("dma_annex.html", &ParseConfig::new("DMA"));
    let reporting = section(&document.annexes[0], "C");
    let table = &reporting.tables[0];
    assert_eq!(table.parse_mode, TableParseMode::Fallback);
    assert_eq!(table.caption, None);
    assert_eq!(table.columns, vec!["col_0", "col_1", "col_2"]);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[1]["col_2"], "Value");
}

#[test]
fn extracted_words_cover_the_annex_text() {
    let document = ai_act();
    for annex in &document.annexes {
        assert!(extracted_word_count(annex) > 0, "ANNEX {}", annex.annex_id);
    }
}
