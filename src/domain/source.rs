use serde::Deserialize;

use super::raw_record::Field;

const DEFAULT_MAX_LISTINGS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    Browser,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Css,
    Attribute,
    Pattern,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Css => "css",
            RuleKind::Attribute => "attribute",
            RuleKind::Pattern => "pattern",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectorRule {
    pub field: Field,
    pub kind: RuleKind,
    pub payload: String,
    // Only used by `RuleKind::Attribute`; defaults to `href`.
    pub attribute: Option<String>,
}

impl SelectorRule {
    pub fn css(field: Field, selector: &str) -> Self {
        SelectorRule {
            field,
            kind: RuleKind::Css,
            payload: selector.to_string(),
            attribute: None,
        }
    }

    pub fn attribute(field: Field, selector: &str, attribute: &str) -> Self {
        SelectorRule {
            field,
            kind: RuleKind::Attribute,
            payload: selector.to_string(),
            attribute: Some(attribute.to_string()),
        }
    }

    pub fn pattern(field: Field, regex: &str) -> Self {
        SelectorRule {
            field,
            kind: RuleKind::Pattern,
            payload: regex.to_string(),
            attribute: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    pub url: String,
    #[serde(default)]
    pub fetch_mode: FetchMode,
    pub listing_selector: String,
    pub rules: Vec<SelectorRule>,
    #[serde(default = "default_max_listings")]
    pub max_listings: usize,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_max_listings() -> usize {
    DEFAULT_MAX_LISTINGS
}

fn default_active() -> bool {
    true
}
