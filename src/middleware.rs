//! Request guards: the login redirect for browsers and the permission check
//! in front of `/admin` and `/api/v1`.

use std::future::{Ready, ready};
use std::rc::Rc;

use actix_identity::IdentityExt;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::StatusCode;
use actix_web::{Error, FromRequest, HttpResponse, web};
use actix_web_flash_messages::FlashMessage;
use futures_util::future::LocalBoxFuture;

use crate::domain::access::AccessDecision;
use crate::domain::types::Guard;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{json_message, redirect, wants_json};
use crate::services::ServiceError;
use crate::services::access::authorize;

pub const LOGIN_PATH: &str = "/login";

/// Turns `401` responses of browser requests into a redirect to the login page.
pub struct RedirectUnauthorized;

impl<S, B> Transform<S, ServiceRequest> for RedirectUnauthorized
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RedirectUnauthorizedMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RedirectUnauthorizedMiddleware { service }))
    }
}

pub struct RedirectUnauthorizedMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RedirectUnauthorizedMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let json = wants_json(req.request());
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            if json || res.status() != StatusCode::UNAUTHORIZED {
                return Ok(res.map_into_left_body());
            }
            let (req, _) = res.into_parts();
            Ok(ServiceResponse::new(req, redirect(LOGIN_PATH)).map_into_right_body())
        })
    }
}

/// Permission gate for one guard. Requests are resolved relative to `prefix`.
#[derive(Clone)]
pub struct AdminAccess {
    guard: Guard,
    prefix: &'static str,
}

impl AdminAccess {
    pub fn new(guard: Guard, prefix: &'static str) -> Self {
        Self { guard, prefix }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminAccess
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AdminAccessMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAccessMiddleware {
            service: Rc::new(service),
            guard: self.guard,
            prefix: self.prefix,
        }))
    }
}

pub struct AdminAccessMiddleware<S> {
    service: Rc<S>,
    guard: Guard,
    prefix: &'static str,
}

impl<S, B> Service<ServiceRequest> for AdminAccessMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let guard = self.guard;
        let prefix = self.prefix;

        // Everything runs inside the future so flash messages reach the
        // framework's mailbox.
        Box::pin(async move {
            let json = guard == Guard::Api || wants_json(req.request());
            let reject = |req: ServiceRequest, response: HttpResponse| {
                Ok(req.into_response(response).map_into_right_body())
            };

            let user = match AuthenticatedUser::extract(req.request()).await {
                Ok(user) => user,
                Err(_) if json => {
                    return reject(req, json_message(StatusCode::UNAUTHORIZED, "Unauthenticated."));
                }
                Err(_) => return reject(req, redirect(LOGIN_PATH)),
            };

            let (Some(repo), Some(config)) = (
                req.app_data::<web::Data<DieselRepository>>().cloned(),
                req.app_data::<web::Data<ServerConfig>>().cloned(),
            ) else {
                log::error!("Repository or ServerConfig is not registered as app data");
                return reject(req, HttpResponse::InternalServerError().finish());
            };

            let path = req
                .path()
                .strip_prefix(prefix)
                .unwrap_or(req.path())
                .to_string();
            let method = req.method().as_str().to_string();

            match authorize(
                repo.get_ref(),
                &user,
                guard,
                &method,
                &path,
                &config.super_admin_role,
            ) {
                Ok(AccessDecision::Granted(_)) => {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Ok(AccessDecision::Denied) => {
                    let message = "This action is unauthorized.";
                    if json {
                        reject(req, json_message(StatusCode::FORBIDDEN, message))
                    } else {
                        reject(req, HttpResponse::Forbidden().body(message))
                    }
                }
                Err(ServiceError::Forbidden(message)) => {
                    if json {
                        return reject(req, json_message(StatusCode::FORBIDDEN, &message));
                    }
                    if let Ok(identity) = req.get_identity() {
                        identity.logout();
                    }
                    FlashMessage::error(message).send();
                    reject(req, redirect(LOGIN_PATH))
                }
                Err(ServiceError::Unauthorized) => {
                    if json {
                        return reject(
                            req,
                            json_message(StatusCode::UNAUTHORIZED, "Unauthenticated."),
                        );
                    }
                    if let Ok(identity) = req.get_identity() {
                        identity.logout();
                    }
                    reject(req, redirect(LOGIN_PATH))
                }
                Err(err) => {
                    log::error!("Access check failed for {method} {path}: {err}");
                    reject(req, HttpResponse::InternalServerError().finish())
                }
            }
        })
    }
}
