//! Integration tests for placing orders.

use oussaili_integration_tests::{TestApp, cart_quantity, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_anonymous_checkout_redirects_to_sign_in() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let visitor = app.visitor();
    visitor.add_to_cart(&lamp).await;

    let response = visitor
        .post_form("/checkout", &[("payment_method", "cash_on_delivery")])
        .await;
    assert_eq!(location(&response), Some("/auth"));
    assert_eq!(cart_quantity(&visitor.cart().await), 1);
}

#[tokio::test]
async fn test_checkout_places_pending_order() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1250).await;
    let customer = app.customer("awa@example.com").await;
    customer.add_to_cart(&lamp).await;
    customer.add_to_cart(&lamp).await;

    let response = customer
        .post_form("/checkout", &[("payment_method", "orange_money")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/profile"));

    let orders = customer.get_json("/api/orders").await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["paymentMethod"], "orange_money");
    assert_eq!(orders[0]["userEmail"], "awa@example.com");
    assert_eq!(orders[0]["total"].as_f64(), Some(25.0));
    assert_eq!(orders[0]["items"][0]["quantity"], 2);

    assert_eq!(cart_quantity(&customer.cart().await), 0);

    let profile = customer.get("/profile").await.text().await.unwrap();
    assert!(profile.contains("orange money"));
}

#[tokio::test]
async fn test_payment_method_defaults_to_cash() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let customer = app.customer("awa@example.com").await;
    customer.add_to_cart(&lamp).await;

    customer.post_form("/checkout", &[]).await;

    let orders = customer.get_json("/api/orders").await;
    assert_eq!(orders[0]["paymentMethod"], "cash_on_delivery");
}

#[tokio::test]
async fn test_empty_cart_places_nothing() {
    let app = TestApp::spawn().await;
    let customer = app.customer("awa@example.com").await;

    let response = customer.post_form("/checkout", &[]).await;
    assert_eq!(location(&response), Some("/cart"));
    assert!(customer.get_json("/api/orders").await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_customers_see_only_their_orders() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;

    let awa = app.customer("awa@example.com").await;
    awa.add_to_cart(&lamp).await;
    awa.post_form("/checkout", &[]).await;

    let musu = app.customer("musu@example.com").await;
    assert!(musu.get_json("/api/orders").await.as_array().unwrap().is_empty());

    let admin = app.admin("owner@example.com").await;
    assert_eq!(admin.get_json("/api/orders").await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_store_outage_keeps_cart() {
    let app = TestApp::spawn().await;
    let lamp = app.seed_product("Lamp", "Home", 1000).await;
    let customer = app.customer("awa@example.com").await;
    customer.add_to_cart(&lamp).await;

    app.store.set_unavailable(true);
    let response = customer.post_form("/checkout", &[]).await;
    app.store.set_unavailable(false);

    assert_ne!(location(&response), Some("/profile"));
    assert_eq!(cart_quantity(&customer.cart().await), 1);
}
