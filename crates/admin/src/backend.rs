//! Service-role client for the hosted backend.
//!
//! Three endpoints are used:
//!
//! - `{backend}/auth/v1/token?grant_type=password` to check admin credentials
//! - `{backend}/rest/v1/{products,favorites}` for rows
//! - `{backend}/storage/v1/object/{bucket}/{key}` for image uploads
//!
//! Requests carry the service key as `apikey` and bearer token. The key
//! bypasses row-level security, so this client never leaves the admin.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tienda_core::{Email, Product, ProductId};
use tracing::instrument;

use crate::config::AdminBackendConfig;
use crate::products::ProductPayload;

/// Errors from the backend.
#[derive(Debug, Error)]
pub enum AdminBackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Email/password rejected by the auth endpoint.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The key cannot be sent as a header.
    #[error("Invalid API key: {0}")]
    InvalidKey(String),
}

/// A successful password sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user_id: String,
    pub email: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct FavoriteEmailRow {
    email: Option<String>,
}

/// Admin client. Cheap to clone.
#[derive(Clone)]
pub struct AdminBackend {
    inner: Arc<AdminBackendInner>,
}

struct AdminBackendInner {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl AdminBackend {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &AdminBackendConfig) -> Result<Self, AdminBackendError> {
        let key = config.service_key.expose_secret();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|e| AdminBackendError::InvalidKey(e.to_string()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| AdminBackendError::InvalidKey(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminBackendInner {
                client,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                bucket: config.bucket.clone(),
            }),
        })
    }

    fn rest(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.inner.base_url)
    }

    /// Check an admin's email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AdminBackendError::InvalidCredentials`] when the auth
    /// endpoint rejects them.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AdminBackendError> {
        let response = self
            .inner
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.inner.base_url
            ))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            tracing::warn!(email, "Admin sign-in rejected");
            return Err(AdminBackendError::InvalidCredentials);
        }
        let body = check(response).await?;
        let token: TokenResponse = serde_json::from_str(&body)?;

        Ok(SignedIn {
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| email.to_string()),
        })
    }

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, AdminBackendError> {
        let url = self.rest("products?select=*&order=created_at.desc");
        let response = self.inner.client.get(url).send().await?;
        Ok(serde_json::from_str(&check(response).await?)?)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns [`AdminBackendError::NotFound`] if no row matches.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, AdminBackendError> {
        let url = self.rest(&format!("products?select=*&id=eq.{}", encode(id)));
        let response = self.inner.client.get(url).send().await?;
        first_row(&check(response).await?, id)
    }

    /// Insert a product and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the row.
    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn insert_product(
        &self,
        payload: &ProductPayload,
    ) -> Result<Product, AdminBackendError> {
        let response = self
            .inner
            .client
            .post(self.rest("products"))
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;
        let body = check(response).await?;
        let product = serde_json::from_str::<Vec<Product>>(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| AdminBackendError::Api {
                status: 200,
                message: "Insert returned no row".to_string(),
            })?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's editable fields and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`AdminBackendError::NotFound`] if no row matches.
    #[instrument(skip(self, payload), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, AdminBackendError> {
        let response = self
            .inner
            .client
            .patch(self.rest(&format!("products?id=eq.{}", encode(id))))
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;
        let product = first_row(&check(response).await?, id)?;
        tracing::info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Delete a product. Deleting a missing product is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), AdminBackendError> {
        let response = self
            .inner
            .client
            .delete(self.rest(&format!("products?id=eq.{}", encode(id))))
            .send()
            .await?;
        check(response).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Upload an object to the image bucket and return its public URL.
    ///
    /// An existing object under `key` is replaced.
    ///
    /// # Errors
    ///
    /// Returns error if the storage endpoint rejects the upload.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AdminBackendError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.inner.base_url, self.inner.bucket, key
        );
        let response = self
            .inner
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        Ok(self.public_url(key))
    }

    /// Public URL of an object in the image bucket.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.inner.base_url, self.inner.bucket, key
        )
    }

    /// Distinct, valid emails of every lead for `product_id`, in first-seen
    /// order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn favorite_emails(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Email>, AdminBackendError> {
        let url = self.rest(&format!(
            "favorites?select=email&product_id=eq.{}",
            encode(product_id)
        ));
        let response = self.inner.client.get(url).send().await?;
        let rows: Vec<FavoriteEmailRow> = serde_json::from_str(&check(response).await?)?;

        let mut seen = HashSet::new();
        let emails = rows
            .into_iter()
            .filter_map(|row| row.email)
            .filter_map(|raw| Email::parse(&raw).ok())
            .filter(|email| seen.insert(email.clone()))
            .collect::<Vec<_>>();
        tracing::debug!(count = emails.len(), "Collected lead emails");
        Ok(emails)
    }
}

fn encode(id: &ProductId) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id.as_str())
}

async fn check(response: reqwest::Response) -> Result<String, AdminBackendError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(AdminBackendError::Api {
            status: status.as_u16(),
            message: text.chars().take(200).collect(),
        });
    }
    Ok(text)
}

fn first_row(body: &str, id: &ProductId) -> Result<Product, AdminBackendError> {
    serde_json::from_str::<Vec<Product>>(body)?
        .into_iter()
        .next()
        .ok_or_else(|| AdminBackendError::NotFound(id.clone()))
}
