use chrono::NaiveDate;
use serde::Serialize;

use super::tender::TenderRecord;

const CLOSING_SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceArea {
    Ifrs17,
    PensionConsulting,
    EnterpriseRiskManagement,
    EsgConsulting,
    RegulatoryCompliance,
    ActuarialServices,
    InvestmentConsulting,
    GovernanceRisk,
}

impl ServiceArea {
    pub const ALL: [ServiceArea; 8] = [
        ServiceArea::Ifrs17,
        ServiceArea::PensionConsulting,
        ServiceArea::EnterpriseRiskManagement,
        ServiceArea::EsgConsulting,
        ServiceArea::RegulatoryCompliance,
        ServiceArea::ActuarialServices,
        ServiceArea::InvestmentConsulting,
        ServiceArea::GovernanceRisk,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceArea::Ifrs17 => "IFRS 17",
            ServiceArea::PensionConsulting => "Pension Consulting",
            ServiceArea::EnterpriseRiskManagement => "Enterprise Risk Management",
            ServiceArea::EsgConsulting => "ESG Consulting",
            ServiceArea::RegulatoryCompliance => "Regulatory Compliance",
            ServiceArea::ActuarialServices => "Actuarial Services",
            ServiceArea::InvestmentConsulting => "Investment Consulting",
            ServiceArea::GovernanceRisk => "Governance & Risk",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ServiceArea::Ifrs17 => &[
                "ifrs 17",
                "ifrs17",
                "insurance contracts",
                "financial reporting",
                "contractual service margin",
                "risk adjustment",
                "premium allocation approach",
            ],
            ServiceArea::PensionConsulting => &[
                "pension",
                "retirement",
                "defined benefit",
                "defined contribution",
                "pension scheme",
                "pension fund",
            ],
            ServiceArea::EnterpriseRiskManagement => &[
                "enterprise risk management",
                "risk framework",
                "risk appetite",
                "risk modelling",
                "stress testing",
                "scenario analysis",
                "solvency",
            ],
            ServiceArea::EsgConsulting => &[
                "esg",
                "sustainability",
                "climate risk",
                "sustainable finance",
                "carbon footprint",
                "green finance",
            ],
            ServiceArea::RegulatoryCompliance => &[
                "regulatory compliance",
                "compliance audit",
                "statutory reporting",
                "prudential regulation",
                "capital requirements",
                "regulatory framework",
            ],
            ServiceArea::ActuarialServices => &[
                "actuarial",
                "reserving",
                "embedded value",
                "financial condition report",
                "product development",
            ],
            ServiceArea::InvestmentConsulting => &[
                "investment consulting",
                "asset liability",
                "investment policy",
                "asset allocation",
                "portfolio management",
                "market risk",
            ],
            ServiceArea::GovernanceRisk => &[
                "corporate governance",
                "risk governance",
                "board advisory",
                "audit committee",
                "risk committee",
                "risk culture",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    Open,
    ClosingSoon,
    Closed,
    Unknown,
}

impl TenderStatus {
    pub fn of(deadline: Option<NaiveDate>, today: NaiveDate) -> Self {
        match deadline {
            None => TenderStatus::Unknown,
            Some(d) if d < today => TenderStatus::Closed,
            Some(d) if (d - today).num_days() <= CLOSING_SOON_DAYS => TenderStatus::ClosingSoon,
            Some(_) => TenderStatus::Open,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TenderStatus::Open => "Open",
            TenderStatus::ClosingSoon => "Closing soon",
            TenderStatus::Closed => "Closed",
            TenderStatus::Unknown => "Deadline unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityScore {
    Minimal,
    Low,
    Medium,
    High,
}

impl OpportunityScore {
    pub fn from_points(points: u32) -> Self {
        match points {
            80.. => OpportunityScore::High,
            50..=79 => OpportunityScore::Medium,
            20..=49 => OpportunityScore::Low,
            _ => OpportunityScore::Minimal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relevance {
    pub keywords_matched: Vec<String>,
    pub service_areas: Vec<ServiceArea>,
    pub points: u32,
    pub score: OpportunityScore,
}

pub fn assess(record: &TenderRecord, extra_keywords: &[String]) -> Relevance {
    let text = format!(
        "{} {}",
        record.title,
        record.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    let mut keywords_matched: Vec<String> = vec![];
    let mut service_areas = vec![];

    for area in ServiceArea::ALL {
        let mut hit = false;
        for keyword in area.keywords() {
            if text.contains(keyword) {
                hit = true;
                if !keywords_matched.iter().any(|k| k == keyword) {
                    keywords_matched.push(keyword.to_string());
                }
            }
        }
        if hit {
            service_areas.push(area);
        }
    }

    for keyword in extra_keywords {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty()
            && text.contains(&keyword)
            && !keywords_matched.contains(&keyword)
        {
            keywords_matched.push(keyword);
        }
    }

    let keyword_points = (keywords_matched.len() as u32 * 10).min(60);
    let area_points = (service_areas.len() as u32 * 10).min(40);
    let points = keyword_points + area_points;

    Relevance {
        keywords_matched,
        service_areas,
        points,
        score: OpportunityScore::from_points(points),
    }
}
