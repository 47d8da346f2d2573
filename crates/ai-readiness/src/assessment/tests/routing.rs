use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::assessment::router::{assessment_router, status_handler, ADMIN_EMAIL_HEADER};

fn router(harness: &Harness) -> Router {
    assessment_router(Arc::new(harness.service()))
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).expect("serialize")))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

async fn begin(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(post_json("/api/v1/assessments", &json!(user())))
        .await
        .expect("begin response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    body["submission_id"]
        .as_str()
        .expect("submission id")
        .to_string()
}

#[tokio::test]
async fn status_handler_returns_not_found_for_unknown_submission() {
    let service = Arc::new(Harness::default().service());

    let response = status_handler(State(service), Path("sub-404".to_string())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_route_lists_domains_and_tiers() {
    let router = router(&Harness::default());

    let response = router
        .oneshot(get("/api/v1/catalog"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let domains = body["domains"].as_array().expect("domains");
    assert_eq!(domains.len(), 5);
    assert_eq!(domains[0]["tiers"][0]["question_count"], 5);
}

#[tokio::test]
async fn full_questionnaire_flow_over_http() {
    let harness = Harness::default();
    let router = router(&harness);
    let id = begin(&router).await;

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/assessments/{id}/payment"),
            &json!({}),
        ))
        .await
        .expect("payment response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["payment_status"], "paid");

    let response = router
        .clone()
        .oneshot(get(&format!("/api/v1/assessments/{id}/questions")))
        .await
        .expect("questions response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(5));

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/assessments/{id}/answers"),
            &json!({ "answers": uniform_answers("Moderately") }),
        ))
        .await
        .expect("answers response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["state"], "notified");
    assert_eq!(body["score"]["average"], 3.0);
    assert_eq!(body["score"]["maturity"], "Established");

    let response = router
        .oneshot(get(&format!("/api/v1/assessments/{id}/report.pdf")))
        .await
        .expect("document response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).expect("content type"),
        "application/pdf"
    );
}

#[tokio::test]
async fn answers_before_payment_require_payment() {
    let harness = Harness::default();
    harness
        .payments
        .set_status(Ok(crate::assessment::submission::PaymentStatus::NotPaid));
    let router = router(&harness);
    let id = begin(&router).await;

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/assessments/{id}/answers"),
            &json!({ "answers": uniform_answers("Fully") }),
        ))
        .await
        .expect("answers response");

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let response = router
        .oneshot(get(&format!("/api/v1/assessments/{id}/report.pdf")))
        .await
        .expect("document response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn begin_rejects_unknown_domain() {
    let router = router(&Harness::default());
    let mut payload = user();
    payload.domain = "Space Mining".to_string();

    let response = router
        .oneshot(post_json("/api/v1/assessments", &json!(payload)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("Space Mining"));
}

#[tokio::test]
async fn begin_reports_gateway_failure() {
    let harness = Harness {
        payments: Arc::new(FakePayments::rejecting_links()),
        ..Harness::default()
    };
    let router = router(&harness);

    let response = router
        .oneshot(post_json("/api/v1/assessments", &json!(user())))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn admin_route_requires_allow_listed_email() {
    let router = router(&Harness::default());

    let response = router
        .clone()
        .oneshot(get("/api/v1/admin/submissions"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(
            Request::get("/api/v1/admin/submissions")
                .header(ADMIN_EMAIL_HEADER, "someone@example.com")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_route_exports_json_and_csv() {
    let harness = Harness::default();
    let router = router(&harness);
    let id = begin(&router).await;
    for (uri, payload) in [
        (format!("/api/v1/assessments/{id}/payment"), json!({})),
        (
            format!("/api/v1/assessments/{id}/answers"),
            json!({ "answers": uniform_answers("Very") }),
        ),
    ] {
        let response = router
            .clone()
            .oneshot(post_json(&uri, &payload))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/admin/submissions")
                .header(ADMIN_EMAIL_HEADER, ADMIN_EMAIL)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["submissions"][0]["submission_id"], id.as_str());

    let response = router
        .oneshot(
            Request::get("/api/v1/admin/submissions?format=csv")
                .header(ADMIN_EMAIL_HEADER, ADMIN_EMAIL)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).expect("content type"),
        "text/csv; charset=utf-8"
    );
    let csv = read_text_body(response).await;
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("Advanced"));
}
