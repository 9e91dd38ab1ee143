//! Integration tests for liveness and readiness.

use oussaili_integration_tests::TestApp;
use reqwest::StatusCode;

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;
    let response = app.visitor().get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let app = TestApp::spawn().await;
    let visitor = app.visitor();
    assert_eq!(visitor.get("/health/ready").await.status(), StatusCode::OK);

    app.store.set_unavailable(true);
    assert_eq!(
        visitor.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
