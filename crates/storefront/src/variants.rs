//! Size and color selection for a product page.
//!
//! Sold-out colors and unavailable sizes are still listed, only disabled.
//! Products with no color or size information get a single sentinel option
//! so the page always has something to select.

use serde::Serialize;
use thiserror::Error;
use tienda_core::{Product, ProductId};

/// Color shown when a product lists none.
pub const DEFAULT_COLOR: &str = "Único";

/// Size shown when a product lists none.
pub const DEFAULT_SIZE: &str = "Talle único";

/// One selectable option as rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantOption {
    pub label: String,
    pub disabled: bool,
}

/// Why a requested variant cannot be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    #[error("Color {0} is sold out")]
    ColorSoldOut(String),

    #[error("Size {0} is unavailable")]
    SizeUnavailable(String),
}

/// A size and color ready to go on a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenVariant {
    pub size: String,
    pub color: String,
}

/// Read-only variant queries over one product.
#[derive(Debug, Clone, Copy)]
pub struct VariantResolver<'a> {
    product: &'a Product,
}

impl<'a> VariantResolver<'a> {
    #[must_use]
    pub const fn new(product: &'a Product) -> Self {
        Self { product }
    }

    /// Cover image, then extra pose images, then the gallery of `color`,
    /// with duplicates dropped on first occurrence.
    #[must_use]
    pub fn active_images(&self, color: &str) -> Vec<&'a str> {
        let product = self.product;
        let mut images: Vec<&'a str> = Vec::new();
        let candidates = product
            .image_url
            .iter()
            .chain(&product.extra_images)
            .chain(product.gallery_for(color));
        for url in candidates {
            let url = url.as_str();
            if !url.trim().is_empty() && !images.contains(&url) {
                images.push(url);
            }
        }
        images
    }

    /// First listed color, or [`DEFAULT_COLOR`].
    #[must_use]
    pub fn default_color(&self) -> &'a str {
        self.product
            .colors
            .first()
            .map_or(DEFAULT_COLOR, String::as_str)
    }

    /// First available size, else the first size at all, else
    /// [`DEFAULT_SIZE`].
    #[must_use]
    pub fn default_size(&self) -> &'a str {
        let sizes = &self.product.sizes;
        sizes
            .iter()
            .find(|s| s.available)
            .or_else(|| sizes.first())
            .map_or(DEFAULT_SIZE, |s| s.size.as_str())
    }

    #[must_use]
    pub fn is_color_sold_out(&self, color: &str) -> bool {
        self.product.is_color_sold_out(color)
    }

    /// Only an explicit `available: false` makes a size unavailable.
    #[must_use]
    pub fn is_size_unavailable(&self, size: &str) -> bool {
        self.product.size(size).is_some_and(|s| !s.available)
    }

    /// Resolve a shopper's pick for the cart. Blank or missing choices fall
    /// back to [`default_size`](Self::default_size) and
    /// [`default_color`](Self::default_color).
    ///
    /// # Errors
    ///
    /// Returns [`VariantError`] for a sold-out color or an unavailable size.
    pub fn choose(
        &self,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<ChosenVariant, VariantError> {
        let color = color
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_color());
        let size = size
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_size());

        if self.is_color_sold_out(color) {
            return Err(VariantError::ColorSoldOut(color.to_owned()));
        }
        if self.is_size_unavailable(size) {
            return Err(VariantError::SizeUnavailable(size.to_owned()));
        }
        Ok(ChosenVariant {
            size: size.to_owned(),
            color: color.to_owned(),
        })
    }

    /// Every color with its disabled flag, or the sentinel alone.
    #[must_use]
    pub fn color_options(&self) -> Vec<VariantOption> {
        if self.product.colors.is_empty() {
            return vec![VariantOption {
                label: DEFAULT_COLOR.to_owned(),
                disabled: false,
            }];
        }
        self.product
            .colors
            .iter()
            .map(|c| VariantOption {
                label: c.clone(),
                disabled: self.is_color_sold_out(c),
            })
            .collect()
    }

    /// Every size with its disabled flag, or the sentinel alone.
    #[must_use]
    pub fn size_options(&self) -> Vec<VariantOption> {
        if self.product.sizes.is_empty() {
            return vec![VariantOption {
                label: DEFAULT_SIZE.to_owned(),
                disabled: false,
            }];
        }
        self.product
            .sizes
            .iter()
            .map(|s| VariantOption {
                label: s.size.clone(),
                disabled: !s.available,
            })
            .collect()
    }
}

/// The color and size currently picked on a product page.
///
/// The two choices are independent. Both reset to the product defaults only
/// when the page switches to a different product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSelection {
    product_id: ProductId,
    pub color: String,
    pub size: String,
}

impl VariantSelection {
    /// Defaults for `product`.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        let resolver = VariantResolver::new(product);
        Self {
            product_id: product.id.clone(),
            color: resolver.default_color().to_owned(),
            size: resolver.default_size().to_owned(),
        }
    }

    /// Defaults for `product`, with `color` preselected when the product
    /// offers it.
    #[must_use]
    pub fn with_color(product: &Product, color: Option<&str>) -> Self {
        let mut selection = Self::for_product(product);
        if let Some(color) = color.filter(|c| product.has_color(c)) {
            color.clone_into(&mut selection.color);
        }
        selection
    }

    pub fn select_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn select_size(&mut self, size: impl Into<String>) {
        self.size = size.into();
    }

    /// Follow the page to `product`. Selections are kept if it is the same
    /// product and reset to its defaults otherwise.
    pub fn sync_product(&mut self, product: &Product) {
        if self.product_id != product.id {
            *self = Self::for_product(product);
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(value: serde_json::Value) -> Product {
        serde_json::from_value(value).unwrap()
    }

    fn dress() -> Product {
        product(json!({
            "id": "v1",
            "price": 100,
            "color": ["Rojo", "Negro"],
            "sold_out_colors": ["Negro"],
            "sizes_data": [{"size": "S", "available": false}, {"size": "M", "available": true}],
            "image_url": "cover.jpg",
            "extra_images": ["pose1.jpg", "cover.jpg"],
            "color_images": [
                {"color": "Rojo", "images": ["rojo1.jpg", "pose1.jpg"]},
                {"color": "Negro", "images": ["negro1.jpg"]}
            ]
        }))
    }

    #[test]
    fn test_active_images_dedup_in_order() {
        let p = dress();
        let resolver = VariantResolver::new(&p);
        assert_eq!(
            resolver.active_images("Rojo"),
            vec!["cover.jpg", "pose1.jpg", "rojo1.jpg"]
        );
        assert_eq!(
            resolver.active_images("Negro"),
            vec!["cover.jpg", "pose1.jpg", "negro1.jpg"]
        );
        assert_eq!(
            resolver.active_images("Verde"),
            vec!["cover.jpg", "pose1.jpg"]
        );
    }

    #[test]
    fn test_defaults() {
        let p = dress();
        let resolver = VariantResolver::new(&p);
        assert_eq!(resolver.default_color(), "Rojo");
        assert_eq!(resolver.default_size(), "M");
    }

    #[test]
    fn test_default_size_when_nothing_available() {
        let p = product(json!({
            "id": "v2", "price": 1,
            "sizes_data": [{"size": "XS", "available": false}, {"size": "S", "available": false}]
        }));
        assert_eq!(VariantResolver::new(&p).default_size(), "XS");
    }

    #[test]
    fn test_default_size_from_legacy_string() {
        let p = product(json!({"id": "v3", "price": 1, "size": "38, 40"}));
        assert_eq!(VariantResolver::new(&p).default_size(), "38");
    }

    #[test]
    fn test_sentinels() {
        let p = product(json!({"id": "v4", "price": 1}));
        let resolver = VariantResolver::new(&p);
        assert_eq!(resolver.default_color(), DEFAULT_COLOR);
        assert_eq!(resolver.default_size(), DEFAULT_SIZE);
        assert!(resolver.active_images(DEFAULT_COLOR).is_empty());
        assert_eq!(resolver.size_options().len(), 1);
        assert_eq!(resolver.color_options().len(), 1);
    }

    #[test]
    fn test_disabled_flags() {
        let p = dress();
        let resolver = VariantResolver::new(&p);
        assert!(resolver.is_color_sold_out("Negro"));
        assert!(!resolver.is_color_sold_out("Rojo"));
        assert!(resolver.is_size_unavailable("S"));
        assert!(!resolver.is_size_unavailable("M"));
        assert!(!resolver.is_size_unavailable("XL"));

        let sizes = resolver.size_options();
        assert_eq!(
            sizes,
            vec![
                VariantOption {
                    label: "S".to_string(),
                    disabled: true
                },
                VariantOption {
                    label: "M".to_string(),
                    disabled: false
                },
            ]
        );
        assert!(resolver.color_options().iter().any(|c| c.label == "Negro" && c.disabled));
    }

    #[test]
    fn test_selections_are_independent() {
        let p = dress();
        let mut selection = VariantSelection::for_product(&p);
        selection.select_size("S");
        selection.select_color("Negro");
        assert_eq!(selection.size, "S");

        selection.select_color("Rojo");
        assert_eq!(selection.size, "S");
        selection.select_size("M");
        assert_eq!(selection.color, "Rojo");
    }

    #[test]
    fn test_sync_product_resets_only_on_identity_change() {
        let p = dress();
        let mut selection = VariantSelection::for_product(&p);
        selection.select_color("Negro");

        selection.sync_product(&p);
        assert_eq!(selection.color, "Negro");

        let other = product(json!({"id": "v9", "price": 1, "color": "Verde", "size": "U"}));
        selection.sync_product(&other);
        assert_eq!(selection.color, "Verde");
        assert_eq!(selection.size, "U");
        assert_eq!(selection.product_id(), &other.id);
    }

    #[test]
    fn test_with_color_ignores_unknown_color() {
        let p = dress();
        assert_eq!(VariantSelection::with_color(&p, Some("Negro")).color, "Negro");
        assert_eq!(VariantSelection::with_color(&p, Some("Lila")).color, "Rojo");
    }

    #[test]
    fn test_choose_defaults_and_rejections() {
        let p = dress();
        let resolver = VariantResolver::new(&p);

        let chosen = resolver.choose(None, Some("  ")).unwrap();
        assert_eq!(chosen.size, "M");
        assert_eq!(chosen.color, "Rojo");

        assert_eq!(
            resolver.choose(Some("M"), Some("Negro")),
            Err(VariantError::ColorSoldOut("Negro".to_owned()))
        );
        assert_eq!(
            resolver.choose(Some("S"), None),
            Err(VariantError::SizeUnavailable("S".to_owned()))
        );
        // Sizes the product does not list are not rejected.
        assert_eq!(resolver.choose(Some("XL"), None).unwrap().size, "XL");
    }
}
