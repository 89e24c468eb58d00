use std::panic::{self, AssertUnwindSafe};

use chrono::NaiveDate;
use futures::FutureExt;
use serde::Serialize;
use sqlx::PgPool;

use crate::{
    configuration::{FetchSettings, Settings},
    domain::{
        source::{FetchMode, SourceConfig},
        tender::TenderRecord,
    },
    error::{FatalError, FetchError, SkipReason},
};

use super::{extract, DestinationOutcome, Droid, Fetcher, HttpLoader, Normalizer, PageLoader, Sink};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub sources_scanned: usize,
    pub sources_failed: usize,
    pub extracted: usize,
    pub accepted: usize,
    pub skipped_missing_title: usize,
    pub duplicates: usize,
    pub parse_warnings: usize,
    pub destinations: Vec<DestinationOutcome>,
}

pub struct Loaders<'a> {
    pub browser: Option<&'a dyn PageLoader>,
    pub http: &'a dyn PageLoader,
}

impl<'a> Loaders<'a> {
    fn for_mode(&self, mode: FetchMode) -> Option<&'a dyn PageLoader> {
        match mode {
            FetchMode::Browser => self.browser,
            FetchMode::Http => Some(self.http),
        }
    }
}

async fn scan_source(
    source: &SourceConfig,
    loaders: &Loaders<'_>,
    fetch: &FetchSettings,
    normalizer: &mut Normalizer,
    records: &mut Vec<TenderRecord>,
    summary: &mut RunSummary,
) -> Result<(), FetchError> {
    let loader = loaders
        .for_mode(source.fetch_mode)
        .ok_or_else(|| FetchError::PageLoad {
            url: source.url.clone(),
            reason: "no browser session".to_string(),
        })?;

    let dom = Fetcher::new(loader, fetch).fetch(&source.url).await?;
    let raw_records = extract(&dom, source)?;
    summary.extracted += raw_records.len();

    for raw in raw_records.iter() {
        match normalizer.normalize(raw, &source.source_id) {
            Ok(normalized) => {
                for warning in normalized.warnings.iter() {
                    log::warn!("[{}] {}: {}", source.source_id, normalized.record.title, warning);
                }
                summary.parse_warnings += normalized.warnings.len();
                summary.accepted += 1;
                records.push(normalized.record);
            }
            Err(SkipReason::MissingTitle) => {
                log::info!("[{}] Dropped listing without a title", source.source_id);
                summary.skipped_missing_title += 1;
            }
            Err(reason @ SkipReason::Duplicate(_)) => {
                log::info!("[{}] Dropped {}", source.source_id, reason);
                summary.duplicates += 1;
            }
        }
    }

    Ok(())
}

// Source failures are logged and counted, never propagated
pub async fn scan_sources(
    sources: &[&SourceConfig],
    loaders: &Loaders<'_>,
    fetch: &FetchSettings,
) -> (Vec<TenderRecord>, RunSummary) {
    let mut normalizer = Normalizer::new();
    let mut records = vec![];
    let mut summary = RunSummary::default();

    for source in sources {
        log::info!("Scanning {} ({})", source.source_id, source.url);
        summary.sources_scanned += 1;

        let before = records.len();
        match scan_source(source, loaders, fetch, &mut normalizer, &mut records, &mut summary).await
        {
            Ok(_) => log::info!(
                "Accepted {} tenders from {}",
                records.len() - before,
                source.source_id
            ),
            Err(e) => {
                log::error!("Skipping source {}: {}", source.source_id, e);
                summary.sources_failed += 1;
            }
        }
    }

    (records, summary)
}

// A panic in the loop is held until the caller has closed its session
async fn scan_sources_unwinding(
    sources: &[&SourceConfig],
    loaders: &Loaders<'_>,
    fetch: &FetchSettings,
) -> std::thread::Result<(Vec<TenderRecord>, RunSummary)> {
    AssertUnwindSafe(scan_sources(sources, loaders, fetch))
        .catch_unwind()
        .await
}

pub struct Scanner<'a> {
    settings: &'a Settings,
    pool: Option<&'a PgPool>,
}

impl<'a> Scanner<'a> {
    pub fn new(settings: &'a Settings, pool: Option<&'a PgPool>) -> Self {
        Scanner { settings, pool }
    }

    fn active_sources(&self) -> Vec<&'a SourceConfig> {
        self.settings.sources.iter().filter(|s| s.active).collect()
    }

    pub async fn run(&self, today: NaiveDate) -> Result<RunSummary, FatalError> {
        let sources = self.active_sources();
        if sources.is_empty() {
            return Err(FatalError::Configuration("no active sources".to_string()));
        }

        let http = HttpLoader::new(&self.settings.fetch)
            .map_err(|e| FatalError::Configuration(format!("http client: {}", e)))?;

        let droid = match sources.iter().any(|s| s.fetch_mode == FetchMode::Browser) {
            true => Some(
                Droid::connect(
                    &self.settings.webdriver,
                    self.settings.fetch.page_load_timeout(),
                )
                .await?,
            ),
            false => None,
        };

        let loaders = Loaders {
            browser: droid.as_ref().map(|d| d as &dyn PageLoader),
            http: &http,
        };
        let scanned = scan_sources_unwinding(&sources, &loaders, &self.settings.fetch).await;

        if let Some(droid) = droid {
            droid.quit().await;
        }

        let (records, summary) = scanned.unwrap_or_else(|payload| panic::resume_unwind(payload));
        Ok(self.finish(records, summary, today).await)
    }

    async fn finish(
        &self,
        records: Vec<TenderRecord>,
        mut summary: RunSummary,
        today: NaiveDate,
    ) -> RunSummary {
        summary.destinations = Sink::new(&self.settings.output, self.pool)
            .write(&records, &self.settings.output.destinations, today)
            .await;

        log::info!(
            "Run finished: {} accepted, {} without title, {} duplicates, {}/{} sources failed",
            summary.accepted,
            summary.skipped_missing_title,
            summary.duplicates,
            summary.sources_failed,
            summary.sources_scanned
        );
        summary
    }

    pub async fn run_with(&self, loaders: &Loaders<'_>, today: NaiveDate) -> RunSummary {
        let sources = self.active_sources();
        let (records, summary) = scan_sources(&sources, loaders, &self.settings.fetch).await;
        self.finish(records, summary, today).await
    }
}
