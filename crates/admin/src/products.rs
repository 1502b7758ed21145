//! Product form validation.
//!
//! The admin edits a [`ProductForm`]; [`ProductForm::validate`] checks it and
//! produces the [`ProductPayload`] written to the `products` table. The
//! payload writes sizes both as `sizes_data` and as the legacy comma-joined
//! `size` column so older readers keep working.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tienda_core::{ColorGallery, Price, Product, SizeOption};

/// Why a product form was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductFormError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Category is required")]
    EmptyCategory,

    #[error("Price must be greater than zero")]
    NonPositivePrice,

    #[error("Sale price must be greater than zero and lower than the price")]
    InvalidSalePrice,

    #[error("Stock cannot be negative")]
    NegativeStock,

    #[error("Sold-out color {0} is not one of the product's colors")]
    UnknownSoldOutColor(String),

    #[error("Gallery color {0} is not one of the product's colors")]
    UnknownGalleryColor(String),
}

/// The admin's product editor.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductForm {
    pub title: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub category: String,
    pub gender: Option<String>,
    pub section: Option<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<SizeOption>,
    pub image_url: Option<String>,
    pub extra_images: Vec<String>,
    pub color_images: Vec<ColorGallery>,
    pub sold_out_colors: Vec<String>,
    pub stock: i64,
    pub sold: bool,
}

/// A validated product row, ready for insert or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPayload {
    pub title: String,
    pub price: Price,
    pub sale_price: Option<Price>,
    pub category: String,
    pub gender: Option<String>,
    pub section: Option<String>,
    pub color: Vec<String>,
    pub sizes_data: Vec<SizeOption>,
    pub size: String,
    pub image_url: Option<String>,
    pub extra_images: Vec<String>,
    pub color_images: Vec<ColorGallery>,
    pub sold_out_colors: Vec<String>,
    pub stock: i64,
    pub sold: bool,
}

impl ProductForm {
    /// Prefill the editor from a stored product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            price: product.price.amount(),
            sale_price: product.sale_price.as_ref().map(Price::amount),
            category: product.category.clone(),
            gender: product.gender.clone(),
            section: product.section.clone(),
            colors: product.colors.clone(),
            sizes: product.sizes.clone(),
            image_url: product.image_url.clone(),
            extra_images: product.extra_images.clone(),
            color_images: product.color_images.clone(),
            sold_out_colors: product.sold_out_colors.clone(),
            stock: product.stock,
            sold: product.sold,
        }
    }

    /// Check the form and normalize it into a payload.
    ///
    /// Labels are trimmed; blank and repeated colors, sizes and image URLs
    /// are dropped, keeping the first occurrence. Galleries with no images
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductFormError`] found.
    pub fn validate(self) -> Result<ProductPayload, ProductFormError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ProductFormError::EmptyTitle);
        }
        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(ProductFormError::EmptyCategory);
        }
        if self.price <= Decimal::ZERO {
            return Err(ProductFormError::NonPositivePrice);
        }
        if let Some(sale) = self.sale_price
            && (sale <= Decimal::ZERO || sale >= self.price)
        {
            return Err(ProductFormError::InvalidSalePrice);
        }
        if self.stock < 0 {
            return Err(ProductFormError::NegativeStock);
        }

        let colors = distinct(self.colors);
        let known: HashSet<&str> = colors.iter().map(String::as_str).collect();

        let sold_out_colors = distinct(self.sold_out_colors);
        if let Some(unknown) = sold_out_colors.iter().find(|c| !known.contains(c.as_str())) {
            return Err(ProductFormError::UnknownSoldOutColor(unknown.clone()));
        }

        let mut color_images = Vec::new();
        for gallery in self.color_images {
            let color = gallery.color.trim().to_string();
            if !known.contains(color.as_str()) {
                return Err(ProductFormError::UnknownGalleryColor(color));
            }
            let images = distinct(gallery.images);
            if !images.is_empty() {
                color_images.push(ColorGallery { color, images });
            }
        }

        let mut seen = HashSet::new();
        let sizes_data: Vec<SizeOption> = self
            .sizes
            .into_iter()
            .filter_map(|option| {
                let size = option.size.trim().to_string();
                (!size.is_empty() && seen.insert(size.clone()))
                    .then(|| SizeOption::new(size, option.available))
            })
            .collect();
        let size = sizes_data
            .iter()
            .map(|option| option.size.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(ProductPayload {
            title,
            price: Price::new(self.price),
            sale_price: self.sale_price.map(Price::new),
            category,
            gender: non_blank(self.gender),
            section: non_blank(self.section),
            color: colors,
            sizes_data,
            size,
            image_url: non_blank(self.image_url),
            extra_images: distinct(self.extra_images),
            color_images,
            sold_out_colors,
            stock: self.stock,
            sold: self.sold,
        })
    }
}

fn distinct(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
