use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::services::{RunRegistry, ScanRequestSender};

#[derive(Serialize)]
struct ScanAccepted {
    run_id: Uuid,
}

#[post("")]
async fn trigger_scan(scan_request_sender: web::Data<ScanRequestSender>) -> HttpResponse {
    match scan_request_sender.request() {
        Some(run_id) => HttpResponse::Accepted().json(ScanAccepted { run_id }),
        None => HttpResponse::ServiceUnavailable().body("Scan handler is not running"),
    }
}

#[get("")]
async fn list_scans(registry: web::Data<RunRegistry>) -> HttpResponse {
    HttpResponse::Ok().json(registry.list())
}

#[get("/{run_id}")]
async fn get_scan(registry: web::Data<RunRegistry>, path: web::Path<Uuid>) -> HttpResponse {
    match registry.get(path.into_inner()) {
        Some(run) => HttpResponse::Ok().json(run),
        None => HttpResponse::NotFound().body("Unknown run"),
    }
}
