use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use scrapeline_core::InterruptReason;

use crate::integration::common::setup_test_app;

async fn body_text(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn root_returns_200_with_empty_body() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn root_is_healthy_while_generator_is_down() {
    let app = setup_test_app();
    app.metrics.set_generator_active("json_feed", false);
    app.metrics
        .inc_interruption("json_feed", InterruptReason::Error);

    let response = app
        .router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_defaults_to_prometheus_text() {
    let app = setup_test_app();
    app.metrics.inc_push("json_feed");
    app.metrics.inc_push("json_feed");

    let response = app
        .router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; version=0.0.4; charset=utf-8"
    );
    let text = body_text(response).await;
    assert!(text.contains("# TYPE push counter\n"));
    assert!(text.contains("push{module=\"json_feed\"} 2\n"));
    assert!(!text.contains("# EOF"));
}

#[tokio::test]
async fn metrics_negotiates_openmetrics() {
    let app = setup_test_app();
    app.metrics.inc_push("json_feed");

    let response = app
        .router
        .oneshot(
            Request::get("/metrics")
                .header(
                    header::ACCEPT,
                    "application/openmetrics-text; version=1.0.0, text/plain;q=0.5",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/openmetrics-text; version=1.0.0; charset=utf-8"
    );
    let text = body_text(response).await;
    assert!(text.contains("push_total{module=\"json_feed\"} 1\n"));
    assert!(text.ends_with("# EOF\n"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
