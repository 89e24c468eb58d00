use actix_web::{get, http::header, post, web, HttpResponse};
use askama::Template;
use sqlx::PgPool;

use crate::{
    dal::tender_db,
    services::{RunRecord, RunRegistry, RunState, ScanRequestSender},
};

struct RunRow {
    run_id: String,
    requested_at: String,
    state: String,
    accepted: String,
    skipped: String,
    duplicates: String,
    detail: String,
}

impl From<RunRecord> for RunRow {
    fn from(run: RunRecord) -> Self {
        let blank = || "-".to_string();
        let (state, accepted, skipped, duplicates, detail) = match run.state {
            RunState::Queued => ("queued", blank(), blank(), blank(), String::new()),
            RunState::Running => ("running", blank(), blank(), blank(), String::new()),
            RunState::Completed { summary } => {
                let failed_destinations: Vec<String> = summary
                    .destinations
                    .iter()
                    .filter(|d| d.error.is_some())
                    .map(|d| d.destination.to_string())
                    .collect();
                let mut detail = format!(
                    "{}/{} sources failed",
                    summary.sources_failed, summary.sources_scanned
                );
                if !failed_destinations.is_empty() {
                    detail.push_str(&format!(
                        "; failed outputs: {}",
                        failed_destinations.join(", ")
                    ));
                }
                (
                    "completed",
                    summary.accepted.to_string(),
                    summary.skipped_missing_title.to_string(),
                    summary.duplicates.to_string(),
                    detail,
                )
            }
            RunState::Failed { error } => ("failed", blank(), blank(), blank(), error),
        };

        RunRow {
            run_id: run.run_id.to_string(),
            requested_at: run.requested_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            state: state.to_string(),
            accepted,
            skipped,
            duplicates,
            detail,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    runs: Vec<RunRow>,
    stored_tenders: Option<i64>,
}

#[get("/dashboard")]
async fn dashboard(
    registry: web::Data<RunRegistry>,
    pool: Option<web::Data<PgPool>>,
) -> HttpResponse {
    let mut runs: Vec<RunRow> = registry.list().into_iter().map(RunRow::from).collect();
    runs.reverse();

    let stored_tenders = match pool {
        Some(pool) => match tender_db::count_tenders(&pool).await {
            Ok(count) => Some(count),
            Err(e) => {
                log::error!("Could not count stored tenders: {:?}", e);
                None
            }
        },
        None => None,
    };

    match (DashboardTemplate {
        runs,
        stored_tenders,
    })
    .render()
    {
        Ok(body) => HttpResponse::Ok().content_type("text/html").body(body),
        Err(e) => {
            log::error!("Failed to render dashboard: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/dashboard/scan")]
async fn dashboard_scan(scan_request_sender: web::Data<ScanRequestSender>) -> HttpResponse {
    if scan_request_sender.request().is_none() {
        return HttpResponse::ServiceUnavailable().body("Scan handler is not running");
    }

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/app/dashboard"))
        .finish()
}
