use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{
    domain::{
        raw_record::{Field, RawRecord},
        source::{RuleKind, SelectorRule, SourceConfig},
    },
    error::FetchError,
};

use super::Dom;

enum Matcher {
    Css(Selector),
    Attribute(Selector, String),
    Pattern(Regex),
}

struct CompiledRule {
    field: Field,
    matcher: Matcher,
}

fn parse_selector(kind: RuleKind, payload: &str) -> Result<Selector, FetchError> {
    Selector::parse(payload).map_err(|e| FetchError::InvalidSelector {
        kind: kind.as_str(),
        payload: payload.to_string(),
        reason: format!("{:?}", e),
    })
}

fn compile(rule: &SelectorRule) -> Result<CompiledRule, FetchError> {
    let matcher = match rule.kind {
        RuleKind::Css => Matcher::Css(parse_selector(rule.kind, &rule.payload)?),
        RuleKind::Attribute => Matcher::Attribute(
            parse_selector(rule.kind, &rule.payload)?,
            rule.attribute.clone().unwrap_or_else(|| "href".to_string()),
        ),
        RuleKind::Pattern => {
            Matcher::Pattern(
                Regex::new(&rule.payload).map_err(|e| FetchError::InvalidSelector {
                    kind: rule.kind.as_str(),
                    payload: rule.payload.clone(),
                    reason: e.to_string(),
                })?,
            )
        }
    };

    Ok(CompiledRule {
        field: rule.field,
        matcher,
    })
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

impl CompiledRule {
    fn apply(&self, listing: ElementRef, listing_text: &str) -> Option<String> {
        let hit = match &self.matcher {
            Matcher::Css(selector) => listing.select(selector).next().map(element_text),
            Matcher::Attribute(selector, attribute) => listing
                .select(selector)
                .find_map(|el| el.value().attr(attribute))
                .map(|v| v.to_string()),
            Matcher::Pattern(regex) => regex.captures(listing_text).and_then(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().to_string())
            }),
        };

        hit.filter(|v| !v.trim().is_empty())
    }
}

fn resolve_link(base: Option<&Url>, link: &str) -> String {
    let link = link.trim();
    match base {
        Some(base) => match base.join(link) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => link.to_string(),
        },
        None => link.to_string(),
    }
}

pub fn extract(dom: &Dom, source: &SourceConfig) -> Result<Vec<RawRecord>, FetchError> {
    let listing_selector = parse_selector(RuleKind::Css, &source.listing_selector)?;
    let rules = source
        .rules
        .iter()
        .map(compile)
        .collect::<Result<Vec<CompiledRule>, FetchError>>()?;
    let base = Url::parse(&dom.url).ok();

    let document = Html::parse_document(&dom.html);
    let listings: Vec<ElementRef> = document
        .select(&listing_selector)
        .take(source.max_listings)
        .collect();

    if listings.is_empty() {
        return Err(FetchError::SelectorNotFound {
            url: dom.url.clone(),
            selector: source.listing_selector.clone(),
        });
    }

    let records = listings
        .into_iter()
        .map(|listing| {
            let listing_text = element_text(listing);
            let mut raw = RawRecord::new();

            for rule in rules.iter() {
                if raw.contains(rule.field) {
                    continue;
                }
                if let Some(value) = rule.apply(listing, &listing_text) {
                    let value = match rule.field {
                        Field::Url => resolve_link(base.as_ref(), &value),
                        _ => value,
                    };
                    raw.set(rule.field, value);
                }
            }

            raw
        })
        .collect();

    Ok(records)
}
