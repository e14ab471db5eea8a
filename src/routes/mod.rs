//! HTTP handlers and the helpers they share.
//!
//! Page handlers answer with a page object (`component`, `props`, `url`):
//! as JSON for XHR visits, embedded in `app.html` for first visits.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tera::{Context, Tera};

use crate::models::auth::AuthenticatedUser;
use crate::services::ServiceError;

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod enquiries;
pub mod health;
pub mod permission_groups;
pub mod permissions;
pub mod roles;
pub mod users;

const PAGE_TEMPLATE: &str = "app.html";
const INERTIA_HEADER: &str = "x-inertia";

/// Whether the client expects JSON instead of a page or a redirect.
pub fn wants_json(req: &HttpRequest) -> bool {
    let headers = req.headers();
    let header_contains = |name: header::HeaderName, needle: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains(needle))
    };

    headers.contains_key(INERTIA_HEADER)
        || header_contains(header::ACCEPT, "application/json")
        || header_contains(header::HeaderName::from_static("x-requested-with"), "xmlhttprequest")
        || req.path().starts_with("/api/")
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Redirects to the referring page, or `fallback` when there is none.
pub fn redirect_back(req: &HttpRequest, fallback: &str) -> HttpResponse {
    let location = req
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback);
    redirect(location)
}

pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

/// JSON body of the form `{"message": ...}` with the given status.
pub fn json_message(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "message": message }))
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Serialize)]
struct PageObject<'a> {
    component: &'a str,
    props: serde_json::Value,
    url: String,
    version: &'static str,
}

/// Renders `component` with `props` plus the shared `auth` and `flash` props.
pub fn render_page<P: Serialize>(
    req: &HttpRequest,
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    user: Option<&AuthenticatedUser>,
    component: &str,
    props: P,
) -> HttpResponse {
    let mut props = match serde_json::to_value(props) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(serde_json::Value::Null) => serde_json::Map::new(),
        Ok(other) => {
            let mut map = serde_json::Map::new();
            map.insert("data".to_string(), other);
            map
        }
        Err(err) => {
            log::error!("Failed to serialize props of {component}: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let alerts = flash_messages
        .iter()
        .map(|f| json!({ "message": f.content(), "level": alert_level_to_str(&f.level()) }))
        .collect::<Vec<_>>();
    props.insert("auth".to_string(), json!({ "user": user }));
    props.insert("flash".to_string(), serde_json::Value::Array(alerts));

    let url = match req.query_string() {
        "" => req.path().to_string(),
        query => format!("{}?{query}", req.path()),
    };
    let page = PageObject {
        component,
        props: serde_json::Value::Object(props),
        url,
        version: env!("CARGO_PKG_VERSION"),
    };

    if wants_json(req) {
        return HttpResponse::Ok()
            .insert_header((INERTIA_HEADER, "true"))
            .insert_header((header::VARY, "X-Inertia"))
            .json(page);
    }

    let page_json = match serde_json::to_string(&page) {
        Ok(json) => json,
        Err(err) => {
            log::error!("Failed to serialize page {component}: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };
    let mut context = Context::new();
    context.insert("page", &page_json);
    context.insert("title", component);
    render_template(tera, PAGE_TEMPLATE, &context)
}

/// Parses a request body as JSON or as an urlencoded form.
pub fn parse_payload<T: DeserializeOwned>(
    req: &HttpRequest,
    body: &web::Bytes,
) -> Result<T, HttpResponse> {
    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let parsed = if is_json {
        serde_json::from_slice::<T>(body).map_err(|e| e.to_string())
    } else {
        serde_html_form::from_bytes::<T>(body).map_err(|e| e.to_string())
    };

    parsed.map_err(|err| {
        log::warn!("Rejected malformed payload on {}: {err}", req.path());
        if wants_json(req) {
            json_message(StatusCode::BAD_REQUEST, "The request body is malformed.")
        } else {
            FlashMessage::error("The submitted form is malformed.").send();
            redirect_back(req, "/dashboard")
        }
    })
}

/// Maps a service failure onto the response the client expects.
///
/// Browser form submissions get flash notices and a redirect to `back`.
pub fn error_response(req: &HttpRequest, err: ServiceError, back: &str) -> HttpResponse {
    let json = wants_json(req);
    match err {
        ServiceError::Validation(errors) => {
            if json {
                let message = ServiceError::Validation(errors.clone()).summary();
                return HttpResponse::UnprocessableEntity()
                    .json(json!({ "message": message, "errors": errors }));
            }
            for message in errors.values().flatten() {
                FlashMessage::error(message.as_str()).send();
            }
            redirect_back(req, back)
        }
        ServiceError::Form(message) | ServiceError::Conflict(message) => {
            if json {
                return json_message(StatusCode::UNPROCESSABLE_ENTITY, &message);
            }
            FlashMessage::error(message).send();
            redirect_back(req, back)
        }
        ServiceError::TypeConstraint(err) => {
            if json {
                return json_message(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string());
            }
            FlashMessage::error(err.to_string()).send();
            redirect_back(req, back)
        }
        ServiceError::Unauthorized => {
            if json {
                json_message(StatusCode::UNAUTHORIZED, "Unauthenticated.")
            } else {
                redirect("/login")
            }
        }
        ServiceError::Forbidden(message) => {
            if json {
                json_message(StatusCode::FORBIDDEN, &message)
            } else {
                HttpResponse::Forbidden().body(message)
            }
        }
        ServiceError::NotFound => {
            if json {
                json_message(StatusCode::NOT_FOUND, "Not Found")
            } else {
                HttpResponse::NotFound().body("Not Found")
            }
        }
        other @ (ServiceError::Repository(_) | ServiceError::Internal(_)) => {
            log::error!("Request {} {} failed: {other}", req.method(), req.path());
            if json {
                json_message(StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            } else {
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}

/// Success notice followed by a redirect, or a JSON body for XHR clients.
pub fn success_response<T: Serialize>(
    req: &HttpRequest,
    status: StatusCode,
    message: &str,
    data: Option<T>,
    location: &str,
) -> HttpResponse {
    if wants_json(req) {
        return HttpResponse::build(status).json(json!({ "message": message, "data": data }));
    }
    FlashMessage::success(message).send();
    redirect(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn detects_json_clients() {
        assert!(wants_json(
            &TestRequest::default()
                .insert_header((header::ACCEPT, "application/json"))
                .to_http_request()
        ));
        assert!(wants_json(
            &TestRequest::default()
                .insert_header(("X-Inertia", "true"))
                .to_http_request()
        ));
        assert!(wants_json(
            &TestRequest::default().uri("/api/v1/users").to_http_request()
        ));
        assert!(!wants_json(
            &TestRequest::default()
                .insert_header((header::ACCEPT, "text/html"))
                .uri("/admin/users")
                .to_http_request()
        ));
    }

    #[test]
    fn validation_errors_are_422_for_json_clients() {
        let req = TestRequest::default()
            .insert_header((header::ACCEPT, "application/json"))
            .to_http_request();
        let resp = error_response(
            &req,
            ServiceError::field("email", "The email has already been taken."),
            "/admin/users",
        );
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_records_are_404() {
        let req = TestRequest::default().to_http_request();
        let resp = error_response(&req, ServiceError::NotFound, "/admin/users");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn parses_urlencoded_lists() {
        #[derive(serde::Deserialize)]
        struct Form {
            roles: Vec<i32>,
            name: Option<String>,
        }

        let req = TestRequest::default()
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .to_http_request();
        let form: Form = parse_payload(&req, &web::Bytes::from_static(b"roles=1&roles=3&name="))
            .unwrap_or_else(|_| panic!("payload should parse"));

        assert_eq!(form.roles, vec![1, 3]);
        assert!(form.name.is_none());
    }
}
