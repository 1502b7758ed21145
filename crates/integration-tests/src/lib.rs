//! Integration tests for Tienda.
//!
//! Each test starts the storefront or admin router on an ephemeral port,
//! points it at a `wiremock` stand-in for the hosted backend, and drives it
//! over HTTP with a cookie-keeping `reqwest` client.
//!
//! # Test Categories
//!
//! - `storefront_catalog` - filtering and product detail
//! - `storefront_cart` - cart session and WhatsApp checkout
//! - `storefront_favorites` - favorites and lead submission
//! - `admin_products` - sign-in, product CRUD, image upload

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use serde_json::{Value, json};
use tienda_admin::backend::AdminBackend;
use tienda_admin::config::AdminConfig;
use tienda_storefront::backend::BackendClient;
use tienda_storefront::config::StorefrontConfig;
use tienda_storefront::leads::spawn_lead_worker;
use wiremock::MockServer;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Shop phone used by every storefront test.
pub const WHATSAPP_PHONE: &str = "+54 9 11 5555 0000";

/// Service key with enough entropy to pass config validation.
pub const SERVICE_KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.c2VydmljZV9yb2xl.Qm9kZ3lTaWc";

/// A running app under test.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Serve `app` on an ephemeral local port.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
#[allow(clippy::unwrap_used)]
pub async fn serve(app: Router) -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        base_url: format!("http://{addr}"),
        client,
    }
}

fn lookup(vars: Vec<(&'static str, String)>) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<&'static str, String> = vars.into_iter().collect();
    move |key| vars.get(key).cloned()
}

/// Start the storefront against `backend`, with a live lead worker.
///
/// # Panics
///
/// Panics if the configuration is rejected.
#[allow(clippy::unwrap_used)]
pub async fn spawn_storefront(backend: &MockServer) -> TestApp {
    let config = StorefrontConfig::from_lookup(lookup(vec![
        ("BACKEND_URL", backend.uri()),
        ("BACKEND_ANON_KEY", "anon-key".to_string()),
        ("WHATSAPP_PHONE", WHATSAPP_PHONE.to_string()),
    ]))
    .unwrap();

    let client = BackendClient::new(&config.backend).unwrap();
    let (leads, _worker) = spawn_lead_worker(client.clone());
    let state = tienda_storefront::state::AppState::new(config, client, leads);
    serve(tienda_storefront::routes::app(state)).await
}

/// Start the admin against `backend`, with email disabled.
///
/// # Panics
///
/// Panics if the configuration is rejected.
#[allow(clippy::unwrap_used)]
pub async fn spawn_admin(backend: &MockServer) -> TestApp {
    let config = AdminConfig::from_lookup(lookup(vec![
        ("BACKEND_URL", backend.uri()),
        ("BACKEND_SERVICE_KEY", SERVICE_KEY.to_string()),
    ]))
    .unwrap();

    let client = AdminBackend::new(&config.backend).unwrap();
    let state = tienda_admin::state::AppState::new(config, client, None);
    serve(tienda_admin::routes::app(state)).await
}

/// Sample catalog rows in the shapes the backend returns.
#[must_use]
pub fn sample_products() -> Value {
    json!([
        {
            "id": 1, "title": "Vestido A", "price": 100, "category": "vestidos",
            "color": ["Negro", "Rojo"], "sold_out_colors": ["Rojo"],
            "sizes_data": [{"size": "S", "available": false}, {"size": "M", "available": true}],
            "image_url": "https://cdn.example/a.jpg",
            "color_images": [{"color": "Negro", "images": ["https://cdn.example/a-negro.jpg"]}]
        },
        {
            "id": 2, "title": "Vestido B", "price": 100, "sale_price": 60,
            "category": "vestidos", "color": "Azul", "size": "M, L"
        },
        {
            "id": 3, "title": "Remera C", "price": "25.50", "category": "remeras",
            "color": "Negro"
        }
    ])
}

/// Serve [`sample_products`] from the mock backend's REST endpoint, both as
/// a list and per `id=eq.{id}` lookup.
pub async fn mount_catalog(backend: &MockServer) {
    let products = sample_products();
    if let Some(rows) = products.as_array() {
        for row in rows {
            let id = row["id"].to_string();
            Mock::given(method("GET"))
                .and(path("/rest/v1/products"))
                .and(query_param("id", format!("eq.{}", id.trim_matches('"'))))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
                .mount(backend)
                .await;
        }
    }
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products))
        .mount(backend)
        .await;
}

/// Requests the mock backend received for `method` and `path`.
pub async fn received(backend: &MockServer, http_method: &str, url_path: &str) -> Vec<Value> {
    backend
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == url_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
        .collect()
}

/// Poll until the mock backend has received `count` matching requests or
/// two seconds pass; returns what was received.
pub async fn wait_for(
    backend: &MockServer,
    http_method: &str,
    url_path: &str,
    count: usize,
) -> Vec<Value> {
    for _ in 0..40 {
        let bodies = received(backend, http_method, url_path).await;
        if bodies.len() >= count {
            return bodies;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    received(backend, http_method, url_path).await
}
