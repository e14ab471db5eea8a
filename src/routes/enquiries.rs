use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, Responder, delete, get, post, route, web};
use actix_web_flash_messages::IncomingFlashMessages;
use chrono::Utc;
use serde_json::json;
use tera::Tera;

use crate::forms::IndexParams;
use crate::forms::enquiries::{EnquiryForm, EnquiryRemarkForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{error_response, parse_payload, render_page, success_response};
use crate::services::enquiries::{
    delete_enquiry, export_enquiries, list_enquiries, show_enquiry, submit_enquiry, update_remark,
};

const INDEX_PATH: &str = "/admin/enquiries";

/// Public contact form; no authentication.
#[post("/enquiries")]
pub async fn submit(
    req: HttpRequest,
    body: web::Bytes,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let form: EnquiryForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match submit_enquiry(repo.get_ref(), form) {
        Ok(enquiry) => success_response(
            &req,
            StatusCode::CREATED,
            "Thank you for your enquiry. We will get back to you soon.",
            Some(enquiry),
            "/",
        ),
        Err(err) => error_response(&req, err, "/"),
    }
}

#[get("/enquiries")]
pub async fn index(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match list_enquiries(repo.get_ref(), &params) {
        Ok(data) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Enquiries/Index",
            data,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/enquiries/export")]
pub async fn export(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match export_enquiries(repo.get_ref(), params.search()) {
        Ok(csv) => {
            let file_name = format!("enquiries-{}.csv", Utc::now().format("%Y%m%d-%H%M%S"));
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ))
                .body(csv)
        }
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/enquiries/{id}")]
pub async fn show(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_enquiry(repo.get_ref(), id.into_inner()) {
        Ok(enquiry) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Enquiries/Show",
            json!({ "enquiry": enquiry }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

#[get("/enquiries/{id}/edit")]
pub async fn edit(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match show_enquiry(repo.get_ref(), id.into_inner()) {
        Ok(enquiry) => render_page(
            &req,
            &tera,
            &flash_messages,
            Some(&user),
            "Enquiries/Edit",
            json!({ "enquiry": enquiry }),
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}

/// Saves the admin remark; the submission itself is read-only.
#[route("/enquiries/{id}", method = "PUT", method = "PATCH")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<i32>,
    body: web::Bytes,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let id = id.into_inner();
    let form: EnquiryRemarkForm = match parse_payload(&req, &body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    match update_remark(repo.get_ref(), &user, id, form) {
        Ok(enquiry) => success_response(
            &req,
            StatusCode::OK,
            "Remark saved successfully.",
            Some(enquiry),
            &format!("{INDEX_PATH}/{id}"),
        ),
        Err(err) => error_response(&req, err, &format!("{INDEX_PATH}/{id}/edit")),
    }
}

#[delete("/enquiries/{id}")]
pub async fn destroy(
    req: HttpRequest,
    id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match delete_enquiry(repo.get_ref(), &user, id.into_inner()) {
        Ok(()) => success_response::<()>(
            &req,
            StatusCode::OK,
            "Enquiry deleted successfully.",
            None,
            INDEX_PATH,
        ),
        Err(err) => error_response(&req, err, INDEX_PATH),
    }
}
