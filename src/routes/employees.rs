use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, delete, get, post, route, web};
use actix_web_flash_messages::IncomingFlashMessages;
use serde_json::json;
use tera::Tera;

use crate::forms::IndexParams;
use crate::forms::employees::EmployeeForm;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, parse_payload, render_page, success_response};
use crate::services::employees::{
    create_employee, delete_employee, list_employees, show_employee, update_employee,
};

const INDEX_PATH: &str = "/admin/employees";

#[get("/employees")]
pub async fn index(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match list_employees(repo.get_ref(), &params) {
        Ok(data) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Employees/Index",
            data,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/employees/create")]
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
        "Employees/Create",
        json!({}),
    )
}

#[post("/employees")]
pub async fn store(
    req: HttpRequest,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let form: EmployeeForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match create_employee(repo.get_ref(), &user, form, server_config.bcrypt_cost) {
        Ok(employee) => success_response(
            &req,
            StatusCode::CREATED,
            "Employee created successfully.",
            Some(employee),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, "/admin/employees/create"),
    }
}

#[get("/employees/{id}")]
pub async fn show(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_employee(repo.get_ref(), id.into_inner()) {
        Ok(employee) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Employees/Show",
            json!({ "employee": employee }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/employees/{id}/edit")]
pub async fn edit(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_employee(repo.get_ref(), id.into_inner()) {
        Ok(employee) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Employees/Edit",
            json!({ "employee": employee }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[route("/employees/{id}", method = "PUT", method = "PATCH")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<i32>,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let id = id.into_inner();
    let form: EmployeeForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match update_employee(repo.get_ref(), &user, id, form, server_config.bcrypt_cost) {
        Ok(employee) => success_response(
            &req,
            StatusCode::OK,
            "Employee updated successfully.",
            Some(employee),
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, &format!("/admin/employees/{id}/edit")),
    }
}

#[delete("/employees/{id}")]
pub async fn destroy(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match delete_employee(repo.get_ref(), &user, id.into_inner()) {
        Ok(()) => success_response::<()>(
            &req,
            StatusCode::OK,
            "Employee deleted successfully.",
            None,
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}
