use std::{collections::HashSet, str::FromStr};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use url::Url;

use crate::{
    domain::{
        raw_record::{Field, RawRecord},
        tender::{DedupKey, TenderRecord},
    },
    error::{ParseWarning, SkipReason},
};

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1000;

// Tried in order. Day-first wins over month-first for `03/04/2024`.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%d %B %Y",
];

const ISO_CURRENCY_CODES: [&str; 24] = [
    "USD", "EUR", "GBP", "JPY", "INR", "KES", "UGX", "TZS", "RWF", "ETB", "NGN", "GHS", "ZAR",
    "ZMW", "BWP", "MWK", "EGP", "MAD", "CAD", "AUD", "NZD", "CHF", "CNY", "AED",
];

// "12,000", "1 500.50" or a plain "75000"
static AMOUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,3}(?:[, ]\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?")
        .expect("amount regex should compile")
});

static CURRENCY_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{3}\b").expect("currency code regex should compile"));

const CURRENCY_SYMBOLS: [(&str, &str); 6] = [
    ("KSh", "KES"),
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₹", "INR"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: TenderRecord,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, Default)]
pub struct Normalizer {
    seen: HashSet<DedupKey>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> usize {
        self.seen.len()
    }

    pub fn normalize(
        &mut self,
        raw: &RawRecord,
        source_id: &str,
    ) -> Result<Normalized, SkipReason> {
        let title = clean(raw.get(Field::Title))
            .map(|t| truncate(t, MAX_TITLE_CHARS))
            .ok_or(SkipReason::MissingTitle)?;

        let mut warnings = vec![];

        let deadline = clean(raw.get(Field::Deadline)).and_then(|text| match parse_date(&text) {
            Some(date) => Some(date),
            None => {
                warnings.push(ParseWarning::Deadline(text));
                None
            }
        });

        let (value, currency) = match clean(raw.get(Field::Value)) {
            Some(text) => match parse_value(&text) {
                Some((value, currency)) => (Some(value), currency),
                None => {
                    warnings.push(ParseWarning::Value(text));
                    (None, None)
                }
            },
            None => (None, None),
        };

        let url = clean(raw.get(Field::Url)).and_then(|text| match is_absolute_link(&text) {
            true => Some(text),
            false => {
                warnings.push(ParseWarning::Url(text));
                None
            }
        });

        let record = TenderRecord {
            source_id: source_id.trim().to_string(),
            title,
            reference: clean(raw.get(Field::Reference)),
            deadline,
            buyer: clean(raw.get(Field::Buyer)),
            value,
            currency,
            location: clean(raw.get(Field::Location)),
            url,
            description: clean(raw.get(Field::Description))
                .map(|d| truncate(d, MAX_DESCRIPTION_CHARS)),
        };

        let key = record.dedup_key();
        if self.seen.contains(&key) {
            return Err(SkipReason::Duplicate(key));
        }
        self.seen.insert(key);

        Ok(Normalized { record, warnings })
    }
}

fn clean(text: Option<&str>) -> Option<String> {
    let cleaned = text?.split_whitespace().collect::<Vec<&str>>().join(" ");
    match cleaned.is_empty() {
        true => None,
        false => Some(cleaned),
    }
}

fn truncate(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text,
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let try_formats =
        |t: &str| DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(t, fmt).ok());

    try_formats(text).or_else(|| {
        // "2024-03-01T12:00:00" and friends
        let prefix: String = text.chars().take(10).collect();
        match prefix.len() < text.len() {
            true => try_formats(&prefix),
            false => None,
        }
    })
}

// Ranges like "£50,000 to £100,000" keep their first bound
pub fn parse_value(text: &str) -> Option<(Decimal, Option<String>)> {
    let amount = AMOUNT_REGEX.find(text)?.as_str().replace([',', ' '], "");

    let currency = CURRENCY_SYMBOLS
        .iter()
        .find(|(symbol, _)| text.contains(symbol))
        .map(|(_, code)| code.to_string())
        .or_else(|| {
            CURRENCY_CODE_REGEX
                .find_iter(text)
                .map(|m| m.as_str())
                .find(|code| ISO_CURRENCY_CODES.contains(code))
                .map(str::to_string)
        });

    Decimal::from_str(&amount)
        .ok()
        .map(|value| (value.normalize(), currency))
}

fn is_absolute_link(text: &str) -> bool {
    match Url::parse(text) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{parse_date, parse_value, Normalizer};
    use crate::{
        domain::raw_record::{Field, RawRecord},
        error::{ParseWarning, SkipReason},
    };

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn normalize_road_repair_listing() {
        let raw = RawRecord::new()
            .with(Field::Title, " Road Repair Contract ")
            .with(Field::Deadline, "2024-03-01")
            .with(Field::Value, "$12,000");

        let normalized = Normalizer::new().normalize(&raw, "muni-a").unwrap();
        let record = normalized.record;

        assert_eq!(record.title, "Road Repair Contract");
        assert_eq!(record.deadline, date(2024, 3, 1));
        assert_eq!(record.value, Some(Decimal::from(12000)));
        assert_eq!(record.value.unwrap().to_string(), "12000");
        assert_eq!(record.currency.as_deref(), Some("USD"));
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn normalize_trims_every_string_field() {
        let raw = RawRecord::new()
            .with(Field::Title, "\n\t Bridge   inspection \n")
            .with(Field::Buyer, "  Ministry of Works ")
            .with(Field::Location, "   ")
            .with(Field::Reference, " RFP-2024/17 ");

        let record = Normalizer::new().normalize(&raw, "muni-a").unwrap().record;

        assert_eq!(record.title, "Bridge inspection");
        assert_eq!(record.buyer.as_deref(), Some("Ministry of Works"));
        assert_eq!(record.reference.as_deref(), Some("RFP-2024/17"));
        assert_eq!(record.location, None);
    }

    #[test]
    fn normalize_skips_missing_title() {
        let mut normalizer = Normalizer::new();

        let blank = RawRecord::new().with(Field::Title, "  \n ");
        let absent = RawRecord::new().with(Field::Buyer, "City");

        assert_eq!(normalizer.normalize(&blank, "muni-a"), Err(SkipReason::MissingTitle));
        assert_eq!(normalizer.normalize(&absent, "muni-a"), Err(SkipReason::MissingTitle));
        assert_eq!(normalizer.accepted(), 0);
    }

    #[test]
    fn normalize_skips_duplicate_urls() {
        let mut normalizer = Normalizer::new();
        let first = RawRecord::new()
            .with(Field::Title, "Road Repair")
            .with(Field::Url, "https://x/1");
        let second = RawRecord::new()
            .with(Field::Title, "Road Repair (amended)")
            .with(Field::Url, "https://x/1");

        assert!(normalizer.normalize(&first, "muni-a").is_ok());
        assert!(matches!(
            normalizer.normalize(&second, "muni-a"),
            Err(SkipReason::Duplicate(_))
        ));
        // Same link on a different source is a different tender
        assert!(normalizer.normalize(&second, "muni-b").is_ok());
    }

    #[test]
    fn normalize_dedups_on_title_and_deadline_without_url() {
        let mut normalizer = Normalizer::new();
        let raw = RawRecord::new()
            .with(Field::Title, "Road Repair")
            .with(Field::Deadline, "01/03/2024");
        let later = RawRecord::new()
            .with(Field::Title, "Road Repair")
            .with(Field::Deadline, "2024-06-01");

        assert!(normalizer.normalize(&raw, "muni-a").is_ok());
        assert!(matches!(
            normalizer.normalize(&raw, "muni-a"),
            Err(SkipReason::Duplicate(_))
        ));
        assert!(normalizer.normalize(&later, "muni-a").is_ok());
        assert_eq!(normalizer.accepted(), 2);
    }

    #[test]
    fn normalize_keeps_record_with_unparseable_fields() {
        let raw = RawRecord::new()
            .with(Field::Title, "Road Repair")
            .with(Field::Deadline, "end of quarter")
            .with(Field::Value, "to be confirmed")
            .with(Field::Url, "/notices/1");

        let normalized = Normalizer::new().normalize(&raw, "muni-a").unwrap();

        assert_eq!(normalized.record.deadline, None);
        assert_eq!(normalized.record.value, None);
        assert_eq!(normalized.record.currency, None);
        assert_eq!(normalized.record.url, None);
        assert_eq!(
            normalized.warnings,
            vec![
                ParseWarning::Deadline("end of quarter".to_string()),
                ParseWarning::Value("to be confirmed".to_string()),
                ParseWarning::Url("/notices/1".to_string()),
            ]
        );
    }

    #[test]
    fn normalize_truncates_long_titles() {
        let raw = RawRecord::new().with(Field::Title, "a".repeat(250));

        let record = Normalizer::new().normalize(&raw, "muni-a").unwrap().record;

        assert_eq!(record.title.chars().count(), 200);
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_date("2024-03-01"), date(2024, 3, 1));
        assert_eq!(parse_date("01/03/2024"), date(2024, 3, 1));
        assert_eq!(parse_date("12/31/2024"), date(2024, 12, 31));
        assert_eq!(parse_date("01-03-2024"), date(2024, 3, 1));
        assert_eq!(parse_date("2024/03/01"), date(2024, 3, 1));
        assert_eq!(parse_date("March 1, 2024"), date(2024, 3, 1));
        assert_eq!(parse_date("1 March 2024"), date(2024, 3, 1));
        assert_eq!(parse_date("2024-03-01T17:00:00Z"), date(2024, 3, 1));
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn parse_value_currencies() {
        let dec = |s: &str| Decimal::from_str(s).unwrap();

        assert_eq!(parse_value("$12,000"), Some((dec("12000"), Some("USD".to_string()))));
        assert_eq!(
            parse_value("EUR 1 500.50"),
            Some((dec("1500.5"), Some("EUR".to_string())))
        );
        assert_eq!(
            parse_value("250,000 KES"),
            Some((dec("250000"), Some("KES".to_string())))
        );
        assert_eq!(
            parse_value("KSh 3,000,000"),
            Some((dec("3000000"), Some("KES".to_string())))
        );
        assert_eq!(parse_value("£ 900.00"), Some((dec("900"), Some("GBP".to_string()))));
        assert_eq!(parse_value("75000"), Some((dec("75000"), None)));
        assert_eq!(parse_value("n/a"), None);
    }

    #[test]
    fn parse_value_ignores_surrounding_prose() {
        let dec = |s: &str| Decimal::from_str(s).unwrap();

        assert_eq!(
            parse_value("£50,000 to £100,000"),
            Some((dec("50000"), Some("GBP".to_string())))
        );
        assert_eq!(
            parse_value("USD 20,000 - 40,000"),
            Some((dec("20000"), Some("USD".to_string())))
        );
        assert_eq!(
            parse_value("Approx. 5,000 USD"),
            Some((dec("5000"), Some("USD".to_string())))
        );
        assert_eq!(parse_value("Est 5,000"), Some((dec("5000"), None)));
        assert_eq!(parse_value("TBC 5,000"), Some((dec("5000"), None)));
        assert_eq!(
            parse_value("Budget: 1,250.75 ZAR incl. VAT"),
            Some((dec("1250.75"), Some("ZAR".to_string())))
        );
    }

    #[test]
    fn normalize_takes_lower_bound_of_value_range() {
        let raw = RawRecord::new()
            .with(Field::Title, "Pension scheme valuation")
            .with(Field::Value, "£50,000 to £100,000");

        let normalized = Normalizer::new().normalize(&raw, "uk-contracts-finder").unwrap();

        assert_eq!(normalized.record.value, Some(Decimal::from(50000)));
        assert_eq!(normalized.record.currency.as_deref(), Some("GBP"));
        assert!(normalized.warnings.is_empty());
    }
}
