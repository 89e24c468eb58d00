use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Reference,
    Deadline,
    Buyer,
    Value,
    Location,
    Url,
    Description,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Reference => "reference",
            Field::Deadline => "deadline",
            Field::Buyer => "buyer",
            Field::Value => "value",
            Field::Location => "location",
            Field::Url => "url",
            Field::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: BTreeMap<Field, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    // Keeps the first value set for a field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| value.into());
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
