//! Client for the hosted backend's REST endpoint.
//!
//! Reads the catalog from `{backend}/rest/v1/products` and writes leads to
//! `{backend}/rest/v1/favorites`. Every request carries the anon key both as
//! `apikey` and as a bearer token. Catalog reads are cached for 5 minutes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tienda_core::{Product, ProductId};
use tracing::instrument;

use crate::config::BackendConfig;
use crate::leads::{Lead, LeadError, LeadSink};

/// Errors from the backend REST API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The key cannot be sent as a header.
    #[error("Invalid API key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Arc<Product>),
}

/// Catalog reader and lead writer. Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    rest_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let key = config.anon_key.expose_secret();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|e| BackendError::InvalidKey(e.to_string()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| BackendError::InvalidKey(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                rest_url: format!("{}/rest/v1", config.url.as_str().trim_end_matches('/')),
                cache,
            }),
        })
    }

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a JSON array.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            tracing::debug!("Product list cache hit");
            return Ok(products.as_ref().clone());
        }

        let url = format!("{}/products?select=*&order=created_at.desc", self.inner.rest_url);
        let body = self.get_text(&url).await?;
        let products: Vec<Product> = parse(&body)?;
        tracing::debug!(count = products.len(), "Fetched product list");

        self.inner
            .cache
            .insert(
                CacheKey::Products,
                CacheValue::Products(Arc::new(products.clone())),
            )
            .await;
        Ok(products)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row matches, or error if the
    /// request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            return Ok(product.as_ref().clone());
        }

        let url = format!(
            "{}/products?select=*&id=eq.{}",
            self.inner.rest_url,
            urlencoding::encode(id.as_str())
        );
        let body = self.get_text(&url).await?;
        let product = parse::<Vec<Product>>(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Arc::new(product.clone())))
            .await;
        Ok(product)
    }

    async fn get_text(&self, url: &str) -> Result<String, BackendError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&text, 500),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: truncate(&text, 200),
            });
        }
        Ok(text)
    }
}

impl LeadSink for BackendClient {
    #[instrument(skip(self, lead), fields(product_id = %lead.product_id))]
    async fn submit(&self, lead: &Lead) -> Result<(), LeadError> {
        let response = self
            .inner
            .client
            .post(format!("{}/favorites", self.inner.rest_url))
            .header("Prefer", "return=minimal")
            .json(lead)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LeadError::Rejected {
                status: status.as_u16(),
                message: truncate(&message, 200),
            });
        }
        Ok(())
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %truncate(body, 500),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use tienda_core::Email;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: server.uri().parse().unwrap(),
            anon_key: SecretString::from("anon-key"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_products_sends_keys_and_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Remera", "price": "25.00", "color": "Negro", "size": "S, M"},
                {"id": 2, "title": "Jean", "price": 60, "colors": ["Azul"], "sizes_data": []}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let products = client.list_products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].colors, vec!["Negro"]);
        assert_eq!(products[0].sizes.len(), 2);

        // Second call is served from cache; `expect(1)` verifies on drop.
        assert_eq!(client.list_products().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let result = client(&server).get_product(&ProductId::new("99")).await;
        assert!(matches!(result, Err(BackendError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_product() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 7, "title": "Buzo", "price": 90}])),
            )
            .mount(&server)
            .await;

        let product = client(&server).get_product(&ProductId::new("7")).await.unwrap();
        assert_eq!(product.title, "Buzo");
    }

    #[tokio::test]
    async fn test_server_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let result = client(&server).list_products().await;
        assert!(matches!(result, Err(BackendError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_submit_lead_posts_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/favorites"))
            .and(body_json(json!({
                "product_id": "5",
                "product_title": "Campera",
                "email": "ana@example.com",
                "phone": null
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let lead = Lead {
            product_id: ProductId::new("5"),
            title: "Campera".to_string(),
            email: Some(Email::parse("ana@example.com").unwrap()),
            phone: None,
        };
        client(&server).submit(&lead).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_lead_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/favorites"))
            .respond_with(ResponseTemplate::new(401).set_body_string("no"))
            .mount(&server)
            .await;

        let lead = Lead {
            product_id: ProductId::new("5"),
            title: "Campera".to_string(),
            email: None,
            phone: None,
        };
        let result = client(&server).submit(&lead).await;
        assert!(matches!(result, Err(LeadError::Rejected { status: 401, .. })));
    }
}
