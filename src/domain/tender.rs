use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const TENDER_FIELDS: [&str; 10] = [
    "source_id",
    "title",
    "reference",
    "deadline",
    "buyer",
    "value",
    "currency",
    "location",
    "url",
    "description",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderRecord {
    pub source_id: String,
    pub title: String,
    pub reference: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub buyer: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl TenderRecord {
    pub fn dedup_key(&self) -> DedupKey {
        match &self.url {
            Some(url) => DedupKey::Link {
                source_id: self.source_id.clone(),
                url: url.clone(),
            },
            None => DedupKey::Listing {
                source_id: self.source_id.clone(),
                title: self.title.clone(),
                deadline: self.deadline,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Link {
        source_id: String,
        url: String,
    },
    Listing {
        source_id: String,
        title: String,
        deadline: Option<NaiveDate>,
    },
}

impl DedupKey {
    pub fn source_id(&self) -> &str {
        match self {
            DedupKey::Link { source_id, .. } | DedupKey::Listing { source_id, .. } => source_id,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            DedupKey::Link { url, .. } => format!("url:{}", url),
            DedupKey::Listing {
                title, deadline, ..
            } => format!(
                "title:{}|{}",
                title,
                deadline.map(|d| d.to_string()).unwrap_or_default()
            ),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_id(), self.encode())
    }
}

#[cfg(test)]
pub(crate) fn sample_record(source_id: &str, title: &str) -> TenderRecord {
    TenderRecord {
        source_id: source_id.to_string(),
        title: title.to_string(),
        reference: None,
        deadline: None,
        buyer: None,
        value: None,
        currency: None,
        location: None,
        url: None,
        description: None,
    }
}
