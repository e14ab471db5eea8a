use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, delete, get, post, route, web};
use actix_web_flash_messages::IncomingFlashMessages;
use serde_json::json;
use tera::Tera;

use crate::forms::IndexParams;
use crate::forms::permission_groups::PermissionGroupForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{error_response, parse_payload, render_page, success_response};
use crate::services::permission_groups::{
    create_permission_group, delete_permission_group, list_permission_groups,
    show_permission_group, update_permission_group,
};

const INDEX_PATH: &str = "/admin/permission-groups";

#[get("/permission-groups")]
pub async fn index(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match list_permission_groups(repo.get_ref(), &params) {
        Ok(data) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "PermissionGroups/Index",
            data,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/permission-groups/create")]
pub async fn create(
    req: HttpRequest,
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    render_page(
        &req,
        &tera,
        &flash_messages,
        Some(&user),
        "PermissionGroups/Create",
        json!({}),
    )
}

#[post("/permission-groups")]
pub async fn store(
    req: HttpRequest,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let form: PermissionGroupForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match create_permission_group(repo.get_ref(), &user, form) {
        Ok(group) => success_response(
            &req,
            StatusCode::CREATED,
            "Permission group created successfully.",
            Some(group),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, "/admin/permission-groups/create"),
    }
}

#[get("/permission-groups/{id}")]
pub async fn show(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_permission_group(repo.get_ref(), id.into_inner()) {
        Ok(group) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "PermissionGroups/Show",
            json!({ "group": group }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/permission-groups/{id}/edit")]
pub async fn edit(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_permission_group(repo.get_ref(), id.into_inner()) {
        Ok(group) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "PermissionGroups/Edit",
            json!({ "group": group }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[route("/permission-groups/{id}", method = "PUT", method = "PATCH")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<i32>,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let id = id.into_inner();
    let form: PermissionGroupForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match update_permission_group(repo.get_ref(), &user, id, form) {
        Ok(group) => success_response(
            &req,
            StatusCode::OK,
            "Permission group updated successfully.",
            Some(group),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, &format!("/admin/permission-groups/{id}/edit")),
    }
}

#[delete("/permission-groups/{id}")]
pub async fn destroy(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match delete_permission_group(repo.get_ref(), &user, id.into_inner()) {
        Ok(()) => success_response::<()>(
            &req,
            StatusCode::OK,
            "Permission group deleted successfully.",
            None,
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}
