use std::{collections::BTreeMap, fmt::Write};

use chrono::NaiveDate;

use crate::domain::{
    relevance::{assess, OpportunityScore, Relevance, ServiceArea, TenderStatus},
    tender::TenderRecord,
};

const TOP_OPPORTUNITIES: usize = 10;

struct Assessed<'a> {
    record: &'a TenderRecord,
    relevance: Relevance,
    status: TenderStatus,
}

fn describe_value(record: &TenderRecord) -> String {
    match (&record.value, &record.currency) {
        (Some(value), Some(currency)) => format!("{} {}", currency, value),
        (Some(value), None) => value.to_string(),
        _ => "Not specified".to_string(),
    }
}

pub fn generate_leads_report(
    records: &[TenderRecord],
    keywords: &[String],
    today: NaiveDate,
) -> String {
    let mut assessed: Vec<Assessed> = records
        .iter()
        .map(|record| Assessed {
            record,
            relevance: assess(record, keywords),
            status: TenderStatus::of(record.deadline, today),
        })
        .collect();

    // Stable: equal scores keep arrival order
    assessed.sort_by(|a, b| b.relevance.points.cmp(&a.relevance.points));

    let mut by_status: BTreeMap<TenderStatus, usize> = BTreeMap::new();
    let mut by_area: BTreeMap<ServiceArea, usize> = BTreeMap::new();
    for a in assessed.iter() {
        *by_status.entry(a.status).or_default() += 1;
        for area in a.relevance.service_areas.iter() {
            *by_area.entry(*area).or_default() += 1;
        }
    }

    let count_score = |score: OpportunityScore| {
        assessed
            .iter()
            .filter(|a| a.relevance.score == score)
            .count()
    };

    let mut report = String::new();
    _ = writeln!(report, "# Tender Opportunities Report");
    _ = writeln!(report, "**Generated for:** {}\n", today);
    _ = writeln!(report, "## Summary");
    _ = writeln!(report, "- **Total tenders:** {}", records.len());
    _ = writeln!(report, "- **High relevance:** {}", count_score(OpportunityScore::High));
    _ = writeln!(
        report,
        "- **Medium relevance:** {}",
        count_score(OpportunityScore::Medium)
    );
    for (status, count) in by_status.iter() {
        _ = writeln!(report, "- **{}:** {}", status.label(), count);
    }

    _ = writeln!(report, "\n## Top Opportunities");
    let open: Vec<&Assessed> = assessed
        .iter()
        .filter(|a| a.status != TenderStatus::Closed)
        .take(TOP_OPPORTUNITIES)
        .collect();
    if open.is_empty() {
        _ = writeln!(report, "\nNo open tenders found.");
    }
    for (i, a) in open.iter().enumerate() {
        let closing = match a.record.deadline {
            Some(deadline) => format!("Closes: {}", deadline),
            None => "Closing date TBD".to_string(),
        };
        let areas = a
            .relevance
            .service_areas
            .iter()
            .map(|area| area.label())
            .collect::<Vec<&str>>()
            .join(", ");

        _ = writeln!(report, "\n### {}. {}", i + 1, a.record.title);
        _ = writeln!(report, "**Source:** {}  ", a.record.source_id);
        if let Some(buyer) = &a.record.buyer {
            _ = writeln!(report, "**Buyer:** {}  ", buyer);
        }
        _ = writeln!(report, "**Status:** {} ({})  ", a.status.label(), closing);
        _ = writeln!(report, "**Value:** {}  ", describe_value(a.record));
        if !areas.is_empty() {
            _ = writeln!(report, "**Service Areas:** {}  ", areas);
        }
        if !a.relevance.keywords_matched.is_empty() {
            _ = writeln!(
                report,
                "**Keywords:** {}  ",
                a.relevance.keywords_matched.join(", ")
            );
        }
        if let Some(url) = &a.record.url {
            _ = writeln!(report, "**URL:** {}", url);
        }
    }

    _ = writeln!(report, "\n## Service Area Breakdown");
    if by_area.is_empty() {
        _ = writeln!(report, "\nNo service area matches.");
    }
    for (area, count) in by_area.iter() {
        _ = writeln!(report, "- **{}:** {} tenders", area.label(), count);
    }

    report
}
