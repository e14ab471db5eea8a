use actix_web::{App, http::StatusCode, http::header, test, web};
use actix_web_flash_messages::Level;
use serde_json::json;

use larabasex::models::auth::AuthenticatedUser;
use larabasex::routes::{alert_level_to_str, auth, enquiries, health};

mod common;

#[::core::prelude::v1::test]
fn test_alert_level_to_str_mappings() {
    assert_eq!(alert_level_to_str(&Level::Error), "danger");
    assert_eq!(alert_level_to_str(&Level::Warning), "warning");
    assert_eq!(alert_level_to_str(&Level::Success), "success");
    assert_eq!(alert_level_to_str(&Level::Info), "info");
    assert_eq!(alert_level_to_str(&Level::Debug), "info");
}

#[actix_web::test]
async fn health_reports_missing_backups_as_warning() {
    let test_db = common::TestDb::new("health_reports_missing_backups_as_warning.db");
    let config = common::server_config(&test_db);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_db.repo()))
            .app_data(web::Data::new(config))
            .service(health::health),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "warning");
    assert_eq!(body["checks"]["database"]["status"], "healthy");
    assert_eq!(body["checks"]["backups"]["status"], "warning");
}

#[actix_web::test]
async fn issue_token_returns_bearer_for_valid_credentials() {
    let test_db = common::TestDb::new("issue_token_returns_bearer.db");
    let config = common::server_config(&test_db);
    let secret = config.secret.clone();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_db.repo()))
            .app_data(web::Data::new(config))
            .service(auth::issue_token),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/token")
        .set_json(json!({
            "email": common::ADMIN_EMAIL,
            "password": common::ADMIN_PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    let claims = AuthenticatedUser::from_jwt(body["token"].as_str().unwrap(), &secret).unwrap();
    assert_eq!(claims.email, common::ADMIN_EMAIL);
    assert_eq!(claims.roles, vec![common::SUPER_ADMIN.to_string()]);
}

#[actix_web::test]
async fn issue_token_rejects_wrong_password() {
    let test_db = common::TestDb::new("issue_token_rejects_wrong_password.db");
    let config = common::server_config(&test_db);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_db.repo()))
            .app_data(web::Data::new(config))
            .service(auth::issue_token),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/token")
        .set_json(json!({ "email": common::ADMIN_EMAIL, "password": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["errors"]["email"].is_array());
}

#[actix_web::test]
async fn public_enquiry_submission_validates_input() {
    let test_db = common::TestDb::new("public_enquiry_submission_validates_input.db");
    let config = common::server_config(&test_db);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_db.repo()))
            .app_data(web::Data::new(config))
            .service(enquiries::submit),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/enquiries")
        .insert_header((header::ACCEPT, "application/json"))
        .set_json(json!({
            "name": "Frank",
            "email": "frank@example.com",
            "message": "Do you ship abroad?",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/enquiries")
        .insert_header((header::ACCEPT, "application/json"))
        .set_json(json!({ "name": "", "email": "not-an-email", "message": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
