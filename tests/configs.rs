use eurlex_ingest::{ParseConfig, ParseError};

#[test]
fn test_load_config_with_defaults() {
    let json = r#"
    {
        "regulation_name": "GDPR",
        "source_url": "https://eur-lex.europa.eu/legal-content/EN/TXT/HTML/?uri=CELEX:32016R0679"
    }
    "#;

    let config = ParseConfig::from_json(json).expect("Failed to parse config");

    assert_eq!(config.regulation_name, "GDPR");
    assert_eq!(config.definition_article_numbers, vec![2, 4]);
    assert_eq!(config.word_ratio_threshold, 0.90);
    assert_eq!(config.celex_id().as_deref(), Some("32016R0679"));
    assert!(config.is_configured_definition_article(4));
    assert!(!config.is_configured_definition_article(6));
}

#[test]
fn test_load_config_from_file() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let json = r#"
    {
        "regulation_name": "AI Act",
        "definition_article_numbers": [3],
        "word_ratio_threshold": 0.75
    }
    "#;

    let mut tmp_file = NamedTempFile::new().expect("Failed to create temp file");
    write!(tmp_file, "{}", json).expect("Failed to write to temp file");

    let config = ParseConfig::load_from_file(tmp_file.path()).expect("Failed to load config");
    assert_eq!(config.regulation_name, "AI Act");
    assert_eq!(config.definition_article_numbers, vec![3]);
    assert_eq!(config.word_ratio_threshold, 0.75);
    assert_eq!(config.source_url, None);
    assert_eq!(config.celex_id(), None);
}

#[test]
fn test_missing_file_is_a_config_error() {
    let err = ParseConfig::load_from_file("/nonexistent/eurlex/config.json").unwrap_err();
    assert!(matches!(err, ParseError::Config(_)));
}

#[test]
fn test_rejects_out_of_range_threshold() {
    let err = ParseConfig::from_json(r#"{ "regulation_name": "DMA", "word_ratio_threshold": 1.5 }"#)
        .unwrap_err();
    assert!(err.to_string().contains("word_ratio_threshold"));
}

#[test]
fn test_rejects_blank_regulation_name() {
    let err = ParseConfig::from_json(r#"{ "regulation_name": "  " }"#).unwrap_err();
    assert!(matches!(err, ParseError::Config(_)));
}

#[test]
fn test_celex_from_path_segment() {
    let config = ParseConfig::new("DMA")
        .with_source_url("https://eur-lex.europa.eu/eli/reg/2022/1925/oj/CELEX:32022R1925");
    assert_eq!(config.celex_id().as_deref(), Some("32022R1925"));
}
