//! Product management route handlers.
//!
//! Every handler requires a signed-in admin. Writes go straight to the
//! backend with the service key; an update that lowers the effective price
//! emails the product's leads in the background.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tienda_core::{Price, Product, ProductId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::notifications::{PriceDrop, notify_price_drop};
use crate::products::ProductForm;
use crate::state::AppState;

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Result of an update.
#[derive(Debug, Serialize)]
pub struct UpdatedProduct {
    pub product: Product,
    /// Set when the update lowered the effective price.
    pub price_drop: Option<PriceChange>,
}

#[derive(Debug, Serialize)]
pub struct PriceChange {
    pub previous: Price,
    pub current: Price,
}

/// An uploaded image.
#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
}

/// List every product, newest first.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.backend().list_products().await?))
}

/// One product, as the editor form.
#[instrument(skip(_admin, state))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductForm>> {
    let product = state.backend().get_product(&id).await?;
    Ok(Json(ProductForm::from_product(&product)))
}

/// Create a product.
#[instrument(skip(admin, state, form), fields(admin = %admin.email))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<Product>)> {
    let payload = form.validate()?;
    let product = state.backend().insert_product(&payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields.
///
/// When the new effective price is lower, the product's leads are emailed
/// after the response is sent; delivery problems are only logged.
#[instrument(skip(admin, state, form), fields(admin = %admin.email))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(form): Json<ProductForm>,
) -> Result<Json<UpdatedProduct>> {
    let payload = form.validate()?;
    let previous = state.backend().get_product(&id).await?;
    let product = state.backend().update_product(&id, &payload).await?;

    let price_drop = PriceDrop::detect(&previous, &product);
    let change = price_drop.as_ref().map(|d| PriceChange {
        previous: d.previous,
        current: d.current,
    });

    if let Some(price_drop) = price_drop {
        tracing::info!(
            previous = %price_drop.previous,
            current = %price_drop.current,
            "Price dropped, notifying leads"
        );
        let state = state.clone();
        tokio::spawn(async move {
            notify_price_drop(
                state.email(),
                state.backend(),
                &state.config().storefront_url,
                &price_drop,
            )
            .await;
        });
    }

    Ok(Json(UpdatedProduct {
        product,
        price_drop: change,
    }))
}

/// Delete a product.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.backend().delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload one image from the `file` field of a multipart form.
///
/// The object key is random; the extension comes from the file name or,
/// failing that, the content type.
#[instrument(skip(admin, state, multipart), fields(admin = %admin.email))]
pub async fn upload_image(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Expected an image, got {content_type}"
            )));
        }
        let extension = image_extension(field.file_name(), &content_type);

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Empty file".to_string()));
        }

        let key = format!("{}.{extension}", uuid::Uuid::new_v4());
        let url = state
            .backend()
            .upload(&key, &content_type, bytes.to_vec())
            .await?;
        tracing::info!(key = %key, size = bytes.len(), "Image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadedImage { key, url })));
    }

    Err(AppError::BadRequest("Missing file field".to_string()))
}

fn image_extension(file_name: Option<&str>, content_type: &str) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| match content_type {
            "image/png" => "png".to_string(),
            "image/webp" => "webp".to_string(),
            "image/gif" => "gif".to_string(),
            _ => "jpg".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension(Some("Foto.JPEG"), "image/jpeg"), "jpeg");
        assert_eq!(image_extension(Some("sin-extension"), "image/png"), "png");
        assert_eq!(image_extension(Some("raro.p/g"), "image/webp"), "webp");
        assert_eq!(image_extension(None, "image/heic"), "jpg");
    }
}
