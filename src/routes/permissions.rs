use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, delete, get, post, route, web};
use actix_web_flash_messages::IncomingFlashMessages;
use chrono::Duration;
use serde_json::json;
use tera::Tera;

use crate::forms::IndexParams;
use crate::forms::permissions::PermissionForm;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, parse_payload, render_page, success_response};
use crate::services::permissions::{
    create_permission, delete_permission, list_permissions, load_form_options,
    load_permission_edit, show_permission, update_permission,
};

const INDEX_PATH: &str = "/admin/permissions";

#[get("/permissions")]
pub async fn index(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match list_permissions(repo.get_ref(), &params) {
        Ok(data) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Permissions/Index",
            data,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/permissions/create")]
pub async fn create(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let ttl = Duration::seconds(server_config.cache.default_ttl_seconds);
    match load_form_options(repo.get_ref(), ttl) {
        Ok(options) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Permissions/Create",
            json!({ "options": options }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[post("/permissions")]
pub async fn store(
    req: HttpRequest,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let form: PermissionForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match create_permission(repo.get_ref(), &user, form) {
        Ok(permission) => success_response(
            &req,
            StatusCode::CREATED,
            "Permission created successfully.",
            Some(permission),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, "/admin/permissions/create"),
    }
}

#[get("/permissions/{id}")]
pub async fn show(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_permission(repo.get_ref(), id.into_inner()) {
        Ok(permission) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Permissions/Show",
            json!({ "permission": permission }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/permissions/{id}/edit")]
pub async fn edit(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let ttl = Duration::seconds(server_config.cache.default_ttl_seconds);
    match load_permission_edit(repo.get_ref(), id.into_inner(), ttl) {
        Ok(data) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Permissions/Edit",
            data,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[route("/permissions/{id}", method = "PUT", method = "PATCH")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<i32>,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let id = id.into_inner();
    let form: PermissionForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match update_permission(repo.get_ref(), &user, id, form) {
        Ok(permission) => success_response(
            &req,
            StatusCode::OK,
            "Permission updated successfully.",
            Some(permission),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, &format!("/admin/permissions/{id}/edit")),
    }
}

#[delete("/permissions/{id}")]
pub async fn destroy(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match delete_permission(repo.get_ref(), &user, id.into_inner()) {
        Ok(()) => success_response::<()>(
            &req,
            StatusCode::OK,
            "Permission deleted successfully.",
            None,
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}
