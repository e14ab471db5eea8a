use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, delete, get, post, route, web};
use actix_web_flash_messages::IncomingFlashMessages;
use serde_json::json;
use tera::Tera;

use crate::forms::IndexParams;
use crate::forms::roles::RoleForm;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, parse_payload, render_page, success_response};
use crate::services::roles::{
    create_role, delete_role, list_roles, load_form_options, load_role_edit, show_role,
    update_role,
};

const INDEX_PATH: &str = "/admin/roles";

#[get("/roles")]
pub async fn index(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match list_roles(repo.get_ref(), &params) {
        Ok(data) => render_page(&req, &tera, &flash_messages, Some(&user), "Roles/Index", data),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/roles/create")]
pub async fn create(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match load_form_options(repo.get_ref()) {
        Ok(options) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Roles/Create",
            json!({ "options": options }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[post("/roles")]
pub async fn store(
    req: HttpRequest,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let form: RoleForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match create_role(repo.get_ref(), &user, form) {
        Ok(role) => success_response(
            &req,
            StatusCode::CREATED,
            "Role created successfully.",
            Some(role),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, "/admin/roles/create"),
    }
}

#[get("/roles/{id}")]
pub async fn show(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_role(repo.get_ref(), id.into_inner()) {
        Ok(role) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Roles/Show",
            json!({ "role": role }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/roles/{id}/edit")]
pub async fn edit(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match load_role_edit(repo.get_ref(), id.into_inner(), &server_config.super_admin_role) {
        Ok(data) => render_page(&req, &tera, &flash_messages, Some(&user), "Roles/Edit", data),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[route("/roles/{id}", method = "PUT", method = "PATCH")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<i32>,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let id = id.into_inner();
    let form: RoleForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match update_role(repo.get_ref(), &user, id, form, &server_config.super_admin_role) {
        Ok(role) => success_response(
            &req,
            StatusCode::OK,
            "Role updated successfully.",
            Some(role),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, &format!("/admin/roles/{id}/edit")),
    }
}

#[delete("/roles/{id}")]
pub async fn destroy(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    match delete_role(
        repo.get_ref(),
        &user,
        id.into_inner(),
        &server_config.super_admin_role,
    ) {
        Ok(()) => success_response::<()>(
            &req,
            StatusCode::OK,
            "Role deleted successfully.",
            None,
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}
