use actix_web::{HttpRequest, Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use serde_json::json;
use tera::Tera;

use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, redirect, render_page};
use crate::services::dashboard::load_dashboard;

#[get("/")]
pub async fn home() -> impl Responder {
    redirect("/dashboard")
}

/// Counts per entity. Any signed-in user may see it.
#[get("/dashboard")]
pub async fn dashboard(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match load_dashboard(repo.get_ref(), &server_config.cache) {
        Ok(stats) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Dashboard",
            json!({ "stats": stats }),
        ),
        Err(err) => error_response(&req, err, "/dashboard"),
    }
}
