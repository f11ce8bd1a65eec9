mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use agromanage::auth::TokenKeys;
use agromanage::models::Role;
use agromanage::routes;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use common::{bearer, offline_state, SECRET};

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(offline_state())
                .configure(routes::configure),
        )
        .await
    };
}

fn error_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .map(|e| e["field"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[actix_web::test]
async fn health_answers_without_a_database() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "status": "ok" }));
}

#[actix_web::test]
async fn register_refuses_admin_role() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "mallory",
            "email": "mallory@x.com",
            "password": "pass123",
            "role": "admin"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["role"]);
}

#[actix_web::test]
async fn register_lists_every_invalid_field() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "", "email": "nope", "password": "123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["username", "email", "password"]);
}

#[actix_web::test]
async fn malformed_json_is_a_validation_error() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["body"]);
}

#[actix_web::test]
async fn login_requires_a_known_role() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "alice", "password": "pass123", "role": "owner" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn protected_routes_need_a_token() {
    let app = app!();
    for (method, uri) in [
        ("GET", "/api/loans"),
        ("POST", "/api/loans"),
        ("GET", "/api/loans/admin"),
        ("PUT", "/api/loans/admin/1"),
        ("GET", "/api/orders"),
        ("GET", "/api/auth/me"),
    ] {
        let req = match method {
            "GET" => test::TestRequest::get(),
            "POST" => test::TestRequest::post(),
            _ => test::TestRequest::put(),
        }
        .uri(uri)
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[actix_web::test]
async fn bad_tokens_get_the_same_generic_401() {
    let app = app!();
    let expired = TokenKeys::new(SECRET, 24)
        .issue_at(5, "alice", Role::Farmer, Utc::now() - Duration::hours(25))
        .unwrap();
    let forged = TokenKeys::new("someone-else", 24)
        .issue(5, "alice", Role::Admin)
        .unwrap();

    let mut bodies = Vec::new();
    for header in [
        format!("Bearer {expired}"),
        format!("Bearer {forged}"),
        "Bearer garbage".to_string(),
    ] {
        let req = test::TestRequest::get()
            .uri("/api/loans")
            .insert_header(("Authorization", header))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        bodies.push(body);
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));

    let req = test::TestRequest::get()
        .uri("/api/loans")
        .insert_header(("Authorization", "Basic YWxpY2U6cGFzcw=="))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn farmers_cannot_list_all_loans() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/loans/admin")
        .insert_header(bearer(2, "alice", Role::Farmer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Admin access required" }));
}

#[actix_web::test]
async fn farmers_are_forbidden_from_loan_decisions_whatever_the_payload() {
    let app = app!();
    let payloads = [
        json!({ "status": "approved" }).to_string(),
        json!({ "status": "bogus" }).to_string(),
        "{not json".to_string(),
    ];
    for payload in payloads {
        let req = test::TestRequest::put()
            .uri("/api/loans/admin/1")
            .insert_header(bearer(2, "alice", Role::Farmer))
            .insert_header(("Content-Type", "application/json"))
            .set_payload(payload.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "payload {payload}");
    }
}

#[actix_web::test]
async fn admin_loan_decision_must_be_approved_or_rejected() {
    let app = app!();
    for status in ["paid", "pending", "", "APPROVED"] {
        let req = test::TestRequest::put()
            .uri("/api/loans/admin/1")
            .insert_header(bearer(1, "admin", Role::Admin))
            .set_json(json!({ "status": status }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "status {status:?}");
    }
}

#[actix_web::test]
async fn loan_below_minimum_is_rejected() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/loans")
        .insert_header(bearer(2, "alice", Role::Farmer))
        .set_json(json!({
            "amount": 500,
            "interest_rate": 5,
            "term_months": 12,
            "type": "equipment"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["amount"]);
}

#[actix_web::test]
async fn catalog_changes_are_admin_only() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(2, "alice", Role::Farmer))
        .set_json(json!({ "name": "Neem Oil", "category": "Pesticides", "price": 10, "stock": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri("/api/products/1")
        .insert_header(bearer(2, "alice", Role::Farmer))
        .set_json(json!({ "stock": 5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn product_fields_are_validated_for_admins() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(1, "admin", Role::Admin))
        .set_json(json!({ "name": "Shovel", "category": "Tools", "price": -3, "stock": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["category", "price"]);
}

#[actix_web::test]
async fn unknown_product_category_filter_is_rejected() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/products?category=Tools")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn empty_orders_are_rejected() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(2, "alice", Role::Farmer))
        .set_json(json!({ "items": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn order_administration_is_role_checked_then_validated() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/orders/admin")
        .insert_header(bearer(2, "alice", Role::Farmer))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri("/api/orders/admin/1")
        .insert_header(bearer(1, "admin", Role::Admin))
        .set_json(json!({ "status": "shipped" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn weather_severity_filter_is_validated() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/weather?severity=extreme")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn non_numeric_ids_are_rejected() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/products/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["id"]);
}

#[actix_web::test]
async fn farmers_get_403_on_admin_routes_even_with_unusable_ids() {
    let app = app!();
    for uri in [
        "/api/loans/admin/abc",
        "/api/loans/admin/99999999999",
        "/api/orders/admin/abc",
        "/api/products/abc",
    ] {
        let req = test::TestRequest::put()
            .uri(uri)
            .insert_header(bearer(2, "alice", Role::Farmer))
            .set_json(json!({ "status": "approved" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[actix_web::test]
async fn admins_get_404_for_ids_that_cannot_exist() {
    let app = app!();
    for (uri, status, message) in [
        ("/api/loans/admin/abc", "approved", "Loan not found"),
        ("/api/loans/admin/99999999999", "rejected", "Loan not found"),
        ("/api/orders/admin/abc", "completed", "Order not found"),
    ] {
        let req = test::TestRequest::put()
            .uri(uri)
            .insert_header(bearer(1, "admin", Role::Admin))
            .set_json(json!({ "status": status }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": message }));
    }
}
