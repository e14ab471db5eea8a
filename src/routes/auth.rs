use actix_identity::Identity;
use actix_web::http::StatusCode;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use chrono::Duration;
use serde_json::json;
use tera::Tera;

use crate::forms::auth::LoginForm;
use crate::middleware::LOGIN_PATH;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, json_message, parse_payload, redirect, render_page, wants_json};
use crate::services::auth::login;

const HOME_PATH: &str = "/dashboard";

#[get("/login")]
pub async fn show_login(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    if user.is_some() {
        return redirect(HOME_PATH);
    }
    render_page(&req, &tera, &flash_messages, None, "Auth/Login", json!({}))
}

#[post("/login")]
pub async fn do_login(
    req: HttpRequest,
    body: web::Bytes,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let form: LoginForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let ttl = Duration::minutes(server_config.token_ttl_minutes);
    let claims = match login(repo.get_ref(), form, ttl) {
        Ok(claims) => claims,
        Err(err) => return error_response(&req, err, LOGIN_PATH),
    };

    let token = match claims.to_jwt(&server_config.secret) {
        Ok(token) => token,
        Err(err) => {
            log::error!("Failed to sign session token: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };
    if let Err(err) = Identity::login(&req.extensions(), token) {
        log::error!("Failed to start session: {err}");
        return HttpResponse::InternalServerError().finish();
    }

    if wants_json(&req) {
        return HttpResponse::Ok().json(json!({ "message": "Signed in.", "user": claims }));
    }
    FlashMessage::success(format!("Welcome back, {}.", claims.name)).send();
    redirect(HOME_PATH)
}

#[post("/logout")]
pub async fn logout(req: HttpRequest, user: Option<Identity>) -> impl Responder {
    if let Some(user) = user {
        user.logout();
    }
    if wants_json(&req) {
        return HttpResponse::NoContent().finish();
    }
    redirect(LOGIN_PATH)
}

/// Issues a bearer token for the `api` guard.
#[post("/api/token")]
pub async fn issue_token(
    req: HttpRequest,
    body: web::Bytes,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let form: LoginForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let ttl = Duration::minutes(server_config.token_ttl_minutes);
    let claims = match login(repo.get_ref(), form, ttl) {
        Ok(claims) => claims,
        Err(err) => return error_response(&req, err, LOGIN_PATH),
    };

    match claims.to_jwt(&server_config.secret) {
        Ok(token) => HttpResponse::Ok().json(json!({
            "token": token,
            "token_type": "Bearer",
            "expires_in": ttl.num_seconds(),
            "user": claims,
        })),
        Err(err) => {
            log::error!("Failed to sign API token: {err}");
            json_message(StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
        }
    }
}
