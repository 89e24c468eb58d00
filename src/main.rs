use std::{net::TcpListener, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Local;
use env_logger::Env;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tender_scout::{
    configuration::{get_configuration, DatabaseSettings},
    services::{scan_job_handler, RunRegistry, ScanRequestSender, Scanner},
    startup::run,
};
use tokio::sync::mpsc;
use uuid::Uuid;

async fn connect(database: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)) // 15 minutes
        .connect_lazy_with(database.with_db());

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration")?;

    let connection_pool = match &configuration.database {
        Some(database) => Some(connect(database).await?),
        None => None,
    };

    // `tender_scout scan` runs once and exits; no argument serves the dashboard
    if std::env::args().nth(1).as_deref() == Some("scan") {
        let today = Local::now().date_naive();
        let summary = Scanner::new(&configuration, connection_pool.as_ref())
            .run(today)
            .await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Dashboard listening on http://{}", address);

    let registry = RunRegistry::default();
    let (scan_sender, scan_receiver) = mpsc::unbounded_channel::<Uuid>();
    let scan_request_sender = ScanRequestSender {
        sender: scan_sender,
        registry: registry.clone(),
    };

    // Spawn background task
    let settings = Arc::new(configuration);
    let pool_clone = connection_pool.clone();
    tokio::spawn(async move { scan_job_handler(scan_receiver, registry, settings, pool_clone).await });

    run(listener, connection_pool, scan_request_sender)?.await?;
    Ok(())
}
