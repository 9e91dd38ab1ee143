//! Integration tests for browsing the catalogue.

use oussaili_integration_tests::TestApp;
use reqwest::StatusCode;

#[tokio::test]
async fn test_home_lists_products() {
    let app = TestApp::spawn().await;
    app.seed_product("Lamp", "Home", 1250).await;
    app.seed_product("Earbuds", "Electronics", 4999).await;

    let body = app.visitor().get("/").await.text().await.unwrap();
    assert!(body.contains("Lamp"));
    assert!(body.contains("Earbuds"));
    assert!(body.contains("$12.50"));
}

#[tokio::test]
async fn test_category_filter_and_search() {
    let app = TestApp::spawn().await;
    app.seed_product("Lamp", "Home", 1250).await;
    app.seed_product("Earbuds", "Electronics", 4999).await;
    let visitor = app.visitor();

    let body = visitor.get("/?category=Electronics").await.text().await.unwrap();
    assert!(body.contains("Earbuds"));
    assert!(!body.contains("Lamp"));

    let body = visitor.get("/?q=lam").await.text().await.unwrap();
    assert!(body.contains("Lamp"));
    assert!(!body.contains("Earbuds"));
}

#[tokio::test]
async fn test_product_page() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1250).await;
    let visitor = app.visitor();

    let response = visitor.get(&format!("/product/{}", lamp.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Lamp for testing"));

    let missing = visitor.get("/product/does-not-exist").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
