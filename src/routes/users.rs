use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, delete, get, post, route, web};
use actix_web_flash_messages::IncomingFlashMessages;
use chrono::Duration;
use serde_json::json;
use tera::Tera;

use crate::forms::IndexParams;
use crate::forms::users::UserForm;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, parse_payload, render_page, success_response};
use crate::services::users::{
    create_user, delete_user, list_users, load_form_options, load_user_edit, show_user,
    toggle_user_status, update_user,
};

const INDEX_PATH: &str = "/admin/users";

fn default_ttl(config: &ServerConfig) -> Duration {
    Duration::seconds(config.cache.default_ttl_seconds)
}

#[get("/users")]
pub async fn index(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match list_users(repo.get_ref(), &params) {
        Ok(data) => render_page(&req, &tera, &flash_messages, Some(&user), "Users/Index", data),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/users/create")]
pub async fn create(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match load_form_options(repo.get_ref(), default_ttl(&server_config)) {
        Ok(options) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Users/Create",
            json!({ "options": options }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[post("/users")]
pub async fn store(
    req: HttpRequest,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let form: UserForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match create_user(repo.get_ref(), &user, form, server_config.bcrypt_cost) {
        Ok(created) => success_response(
            &req,
            StatusCode::CREATED,
            "User created successfully.",
            Some(created),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, "/admin/users/create"),
    }
}

#[get("/users/{id}")]
pub async fn show(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_user(repo.get_ref(), id.into_inner()) {
        Ok(details) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Users/Show",
            json!({ "user": details }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/users/{id}/edit")]
pub async fn edit(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match load_user_edit(repo.get_ref(), id.into_inner(), default_ttl(&server_config)) {
        Ok(data) => render_page(&req, &tera, &flash_messages, Some(&user), "Users/Edit", data),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[route("/users/{id}", method = "PUT", method = "PATCH")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<i32>,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let id = id.into_inner();
    let form: UserForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match update_user(repo.get_ref(), &user, id, form, server_config.bcrypt_cost) {
        Ok(updated) => success_response(
            &req,
            StatusCode::OK,
            "User updated successfully.",
            Some(updated),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, &format!("/admin/users/{id}/edit")),
    }
}

#[delete("/users/{id}")]
pub async fn destroy(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match delete_user(repo.get_ref(), &user, id.into_inner()) {
        Ok(()) => success_response::<()>(
            &req,
            StatusCode::OK,
            "User deleted successfully.",
            None,
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[post("/users/{id}/toggle-status")]
pub async fn toggle_status(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match toggle_user_status(repo.get_ref(), &user, id.into_inner()) {
        Ok(updated) => {
            let message = format!("User is now {}.", updated.status);
            success_response(&req, StatusCode::OK, &message, Some(updated), INDEX_PATH)
        }
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}
