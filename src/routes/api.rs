//! JSON index actions of the `api` guard, mounted under `/api/v1`.

use actix_web::{HttpRequest, HttpResponse, Responder, get, web};

use crate::forms::IndexParams;
use crate::repository::DieselRepository;
use crate::routes::error_response;
use crate::services::enquiries::list_enquiries;
use crate::services::users::list_users;

#[get("/users")]
pub async fn api_v1_users(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match list_users(repo.get_ref(), &params) {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(err) => error_response(&req, err, "/api/v1/users"),
    }
}

#[get("/enquiries")]
pub async fn api_v1_enquiries(
    req: HttpRequest,
    params: web::Query<IndexParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match list_enquiries(repo.get_ref(), &params) {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(err) => error_response(&req, err, "/api/v1/enquiries"),
    }
}
