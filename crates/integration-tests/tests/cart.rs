//! Integration tests for the session cart.

use oussaili_integration_tests::{TestApp, cart_quantity, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_add_same_product_increments_quantity() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1250).await;
    let visitor = app.visitor();

    let response = visitor.add_to_cart(&lamp).await;
    assert_eq!(location(&response), Some("/cart"));
    visitor.add_to_cart(&lamp).await;

    let cart = visitor.cart().await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart_quantity(&cart), 2);
    assert_eq!(cart["total"].as_f64(), Some(25.0));
}

#[tokio::test]
async fn test_htmx_add_returns_count_and_trigger() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1250).await;
    let visitor = app.visitor();

    let response = visitor
        .htmx_post("/cart/add", &[("product_id", lamp.id.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let trigger = response.headers()["HX-Trigger"].to_str().unwrap().to_string();
    assert!(trigger.contains("cart-updated"));
    assert!(trigger.contains("Added Lamp to cart"));

    let body = response.text().await.unwrap();
    assert!(body.contains('1'));
}

#[tokio::test]
async fn test_unknown_product_is_not_added() {
    let app = TestApp::spawn().await;
    let visitor = app.visitor();

    visitor
        .post_form("/cart/add", &[("product_id", "missing")])
        .await;
    assert_eq!(cart_quantity(&visitor.cart().await), 0);
}

#[tokio::test]
async fn test_update_and_remove() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let rug = app.seed_product("Rug", "Home", 4000).await;
    let visitor = app.visitor();
    visitor.add_to_cart(&lamp).await;
    visitor.add_to_cart(&rug).await;

    let response = visitor
        .htmx_post(
            "/cart/update",
            &[("product_id", lamp.id.as_str()), ("quantity", "3")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("cart-items"));

    let cart = visitor.cart().await;
    assert_eq!(cart_quantity(&cart), 4);
    assert_eq!(cart["total"].as_f64(), Some(70.0));

    visitor
        .post_form("/cart/remove", &[("product_id", rug.id.as_str())])
        .await;
    let cart = visitor.cart().await;
    assert_eq!(cart_quantity(&cart), 3);
    assert_eq!(cart["total"].as_f64(), Some(30.0));

    visitor
        .post_form(
            "/cart/update",
            &[("product_id", lamp.id.as_str()), ("quantity", "0")],
        )
        .await;
    assert_eq!(cart_quantity(&visitor.cart().await), 0);
}

#[tokio::test]
async fn test_carts_are_per_visitor() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let first = app.visitor();
    let second = app.visitor();

    first.add_to_cart(&lamp).await;
    assert_eq!(cart_quantity(&first.cart().await), 1);
    assert_eq!(cart_quantity(&second.cart().await), 0);
}

#[tokio::test]
async fn test_cart_survives_sign_out() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let customer = app.customer("awa@example.com").await;

    customer.add_to_cart(&lamp).await;
    customer.logout().await;
    assert_eq!(cart_quantity(&customer.cart().await), 1);
}

#[tokio::test]
async fn test_count_fragment() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let visitor = app.visitor();
    visitor.add_to_cart(&lamp).await;
    visitor.add_to_cart(&lamp).await;

    let body = visitor.get("/cart/count").await.text().await.unwrap();
    assert!(body.contains('2'));
}

#[tokio::test]
async fn test_concurrent_adds_in_one_session_are_all_kept() {
    const ADDS: u64 = 200;

    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let visitor = app.visitor();
    visitor.add_to_cart(&lamp).await;

    let url = format!("{}/cart/add", app.base_url);
    let mut adds = tokio::task::JoinSet::new();
    for _ in 0..ADDS {
        let client = visitor.client.clone();
        let url = url.clone();
        let product_id = lamp.id.as_str().to_string();
        adds.spawn(async move {
            client
                .post(url)
                .form(&[("product_id", product_id)])
                .send()
                .await
                .unwrap()
                .status()
        });
    }
    while let Some(status) = adds.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::SEE_OTHER);
    }

    assert_eq!(cart_quantity(&visitor.cart().await), ADDS + 1);
}
