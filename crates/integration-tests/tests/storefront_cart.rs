//! Cart session and WhatsApp checkout over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::{Value, json};
use tienda_core::Price;
use tienda_integration_tests::{TestApp, mount_catalog, spawn_storefront};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn storefront() -> (MockServer, TestApp) {
    let backend = MockServer::start().await;
    mount_catalog(&backend).await;
    let app = spawn_storefront(&backend).await;
    (backend, app)
}

async fn post(app: &TestApp, path: &str, body: Value) -> reqwest::Response {
    app.client
        .post(app.url(path))
        .json(&body)
        .send()
        .await
        .unwrap()
}

fn total(view: &Value) -> Price {
    serde_json::from_value(view["total"].clone()).unwrap()
}

#[tokio::test]
async fn test_same_variant_merges_into_one_line() {
    let (_backend, app) = storefront().await;

    for _ in 0..2 {
        let response = post(
            &app,
            "/cart/add",
            json!({"product_id": "1", "size": "M", "color": "Negro"}),
        )
        .await;
        assert_eq!(response.status(), 200);
    }

    let view: Value = app
        .client
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["lines"].as_array().unwrap().len(), 1);
    assert_eq!(view["lines"][0]["key"], "1-M-Negro");
    assert_eq!(view["lines"][0]["quantity"], 2);
    assert_eq!(view["count"], 2);
    assert_eq!(total(&view), Price::from(200));
}

#[tokio::test]
async fn test_defaults_and_sale_price() {
    let (_backend, app) = storefront().await;

    // B is on sale; no size or color given.
    let view: Value = post(&app, "/cart/add", json!({"product_id": "2"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["lines"][0]["key"], "2-M-Azul");
    assert_eq!(total(&view), Price::from(60));

    let count: Value = app
        .client
        .get(app.url("/cart/count"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_unbuyable_variants_rejected() {
    let (_backend, app) = storefront().await;

    let response = post(
        &app,
        "/cart/add",
        json!({"product_id": "1", "size": "M", "color": "Rojo"}),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Color Rojo is sold out");

    let response = post(
        &app,
        "/cart/add",
        json!({"product_id": "1", "size": "S", "color": "Negro"}),
    )
    .await;
    assert_eq!(response.status(), 400);

    let view: Value = app
        .client
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["count"], 0);
}

#[tokio::test]
async fn test_unknown_product_not_added() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(1)
        .mount(&backend)
        .await;
    mount_catalog(&backend).await;
    let app = spawn_storefront(&backend).await;

    let response = post(&app, "/cart/add", json!({"product_id": "99"})).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_quantity_updates_and_removal() {
    let (_backend, app) = storefront().await;
    post(&app, "/cart/add", json!({"product_id": "3"})).await;
    post(&app, "/cart/add", json!({"product_id": "2"})).await;

    let view: Value = post(&app, "/cart/update", json!({"key": "3-Talle único-Negro", "quantity": 4}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["count"], 5);
    assert_eq!(total(&view), Price::from(162));

    // Removing a missing line leaves the cart alone.
    let view: Value = post(&app, "/cart/remove", json!({"key": "nope"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["count"], 5);

    let response = post(&app, "/cart/update", json!({"key": "nope", "quantity": 1})).await;
    assert_eq!(response.status(), 404);

    let view: Value = post(&app, "/cart/update", json!({"key": "2-M-Azul", "quantity": 0}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["lines"].as_array().unwrap().len(), 1);

    let view: Value = post(&app, "/cart/clear", json!({})).await.json().await.unwrap();
    assert_eq!(view["count"], 0);
    assert_eq!(total(&view), Price::ZERO);
}

#[tokio::test]
async fn test_checkout_redirects_to_whatsapp() {
    let (_backend, app) = storefront().await;

    let response = app.client.get(app.url("/checkout")).send().await.unwrap();
    assert_eq!(response.status(), 400);

    post(
        &app,
        "/cart/add",
        json!({"product_id": "1", "size": "M", "color": "Negro"}),
    )
    .await;

    let response = app.client.get(app.url("/checkout")).send().await.unwrap();
    assert_eq!(response.status(), 303);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://wa.me/5491155550000?text="));
    assert!(location.contains("Vestido%20A"));
}

#[tokio::test]
async fn test_carts_are_per_visitor() {
    let (_backend, app) = storefront().await;
    post(&app, "/cart/add", json!({"product_id": "2"})).await;

    // A second client has its own cookie jar, hence its own session.
    let other = reqwest::Client::builder().cookie_store(true).build().unwrap();
    let view: Value = other
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["count"], 0);
}
