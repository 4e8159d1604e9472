use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_WORD_RATIO_THRESHOLD: f64 = 0.90;

fn default_definition_article_numbers() -> Vec<u32> {
    vec![2, 4]
}

fn default_word_ratio_threshold() -> f64 {
    DEFAULT_WORD_RATIO_THRESHOLD
}

/// Per-document settings supplied by the caller alongside the markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseConfig {
    pub regulation_name: String,
    #[serde(default = "default_definition_article_numbers")]
    pub definition_article_numbers: Vec<u32>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default = "default_word_ratio_threshold")]
    pub word_ratio_threshold: f64,
}

impl ParseConfig {
    pub fn new(regulation_name: impl Into<String>) -> Self {
        Self {
            regulation_name: regulation_name.into(),
            definition_article_numbers: default_definition_article_numbers(),
            source_url: None,
            word_ratio_threshold: DEFAULT_WORD_RATIO_THRESHOLD,
        }
    }

    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = Some(source_url.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let config: ParseConfig = serde_json::from_str(json)
            .map_err(|e| ParseError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ParseError::Config(format!("Failed to read config file: {e}")))?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), ParseError> {
        if self.regulation_name.trim().is_empty() {
            return Err(ParseError::Config(
                "regulation_name must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.word_ratio_threshold) {
            return Err(ParseError::Config(format!(
                "word_ratio_threshold must be within 0..=1, got {}",
                self.word_ratio_threshold
            )));
        }
        Ok(())
    }

    /// CELEX identifier carried in a EUR-Lex URL, e.g. `?uri=CELEX:32016R0679`.
    pub fn celex_id(&self) -> Option<String> {
        let url = reqwest::Url::parse(self.source_url.as_deref()?).ok()?;
        url.query_pairs()
            .map(|(_, value)| value.into_owned())
            .chain(url.path_segments()?.map(ToString::to_string))
            .find_map(|value| {
                let (_, celex) = value.split_once("CELEX:")?;
                let celex = celex.trim();
                if celex.is_empty() {
                    None
                } else {
                    Some(celex.to_string())
                }
            })
    }

    pub fn is_configured_definition_article(&self, article_number: u32) -> bool {
        self.definition_article_numbers.contains(&article_number)
    }
}
