use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use crate::{
    routes::{dashboard_route, default_route, scan_route},
    services::ScanRequestSender,
};

pub fn run(
    listener: TcpListener,
    db_pool: Option<PgPool>,
    scan_request_sender: ScanRequestSender,
) -> Result<Server, std::io::Error> {
    let db_pool = db_pool.map(web::Data::new);
    let registry = web::Data::new(scan_request_sender.registry.clone());
    let scan_request_sender = web::Data::new(scan_request_sender);

    let server = HttpServer::new(move || {
        let app = App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/scan")
                    .service(scan_route::trigger_scan)
                    .service(scan_route::list_scans)
                    .service(scan_route::get_scan),
            )
            .service(
                web::scope("/app")
                    .service(dashboard_route::dashboard)
                    .service(dashboard_route::dashboard_scan),
            )
            .app_data(registry.clone())
            .app_data(scan_request_sender.clone());

        match db_pool.clone() {
            Some(pool) => app.app_data(pool),
            None => app,
        }
    })
    .listen(listener)?
    .run();

    Ok(server)
}
