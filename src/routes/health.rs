use actix_web::{HttpResponse, Responder, get, web};
use chrono::Utc;

use crate::db::ping;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::services::backup::monitor;
use crate::services::cache::status;
use crate::services::health::check_health;

/// `200` while the service can answer requests, `503` otherwise.
#[get("/health")]
pub async fn health(
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let report = check_health(
        ping(repo.pool()),
        status(repo.get_ref()),
        &monitor(&server_config.backup, Utc::now().naive_utc()),
    );

    if report.is_available() {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::ServiceUnavailable().json(report)
    }
}
