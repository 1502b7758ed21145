//! Product records.
//!
//! The backend stores colors either as a single string or as a list, and
//! sizes either as a `sizes_data` availability list or as a legacy
//! comma-joined `size` string. [`ProductRecord`] accepts every shape the
//! table has ever held; [`Product`] is the canonical form produced from it,
//! so nothing downstream has to look at the raw shape again.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Price, ProductId};

/// A size label and whether it can currently be bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOption {
    pub size: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl SizeOption {
    #[must_use]
    pub fn new(size: impl Into<String>, available: bool) -> Self {
        Self {
            size: size.into(),
            available,
        }
    }
}

/// Images shown when a given color is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGallery {
    pub color: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// The `color` column: one label or an ordered list of labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorField {
    One(String),
    Many(Vec<String>),
}

/// A product row exactly as the backend returns it.
///
/// Every field tolerates `null` and values of the wrong type, falling back to
/// its default, so one bad row never fails a whole catalog fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    #[serde(deserialize_with = "lenient")]
    pub id: ProductId,
    #[serde(deserialize_with = "lenient")]
    pub title: String,
    #[serde(deserialize_with = "lenient")]
    pub price: Price,
    #[serde(deserialize_with = "lenient")]
    pub sale_price: Option<Price>,
    #[serde(deserialize_with = "lenient")]
    pub category: String,
    #[serde(deserialize_with = "lenient")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub section: Option<String>,
    #[serde(alias = "colors", deserialize_with = "lenient")]
    pub color: Option<ColorField>,
    #[serde(alias = "sizes", deserialize_with = "lenient")]
    pub sizes_data: Option<Vec<SizeOption>>,
    #[serde(deserialize_with = "lenient")]
    pub size: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub extra_images: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub color_images: Option<Vec<ColorGallery>>,
    #[serde(deserialize_with = "lenient")]
    pub sold_out_colors: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub stock: i64,
    #[serde(deserialize_with = "lenient")]
    pub sold: bool,
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Deserialize a field, replacing `null` or a mistyped value with the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// A product in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProductRecord")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub sale_price: Option<Price>,
    pub category: String,
    pub gender: Option<String>,
    pub section: Option<String>,
    /// Color labels in display order.
    pub colors: Vec<String>,
    /// Size labels in display order with availability.
    pub sizes: Vec<SizeOption>,
    pub image_url: Option<String>,
    pub extra_images: Vec<String>,
    pub color_images: Vec<ColorGallery>,
    pub sold_out_colors: Vec<String>,
    pub stock: i64,
    pub sold: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let colors = match record.color {
            Some(ColorField::One(color)) => vec![color],
            Some(ColorField::Many(colors)) => colors,
            None => Vec::new(),
        }
        .into_iter()
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .collect();

        let sizes: Vec<SizeOption> = record
            .sizes_data
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.size.trim().is_empty())
            .collect();
        let sizes = if sizes.is_empty() {
            parse_legacy_sizes(record.size.as_deref().unwrap_or_default())
        } else {
            sizes
        };

        Self {
            id: record.id,
            title: record.title,
            price: record.price,
            sale_price: record.sale_price,
            category: record.category,
            gender: record.gender.filter(|g| !g.is_empty()),
            section: record.section.filter(|s| !s.is_empty()),
            colors,
            sizes,
            image_url: non_blank(record.image_url),
            extra_images: record
                .extra_images
                .unwrap_or_default()
                .into_iter()
                .filter(|url| !url.trim().is_empty())
                .collect(),
            color_images: record.color_images.unwrap_or_default(),
            sold_out_colors: record.sold_out_colors.unwrap_or_default(),
            stock: record.stock,
            sold: record.sold,
            created_at: record.created_at,
        }
    }
}

/// Parse a legacy `"S, M, L"` size string. Every parsed size is available.
#[must_use]
pub fn parse_legacy_sizes(joined: &str) -> Vec<SizeOption> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| SizeOption::new(s, true))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Product {
    /// The sale price when it is strictly lower than the base price,
    /// otherwise the base price.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        match self.sale_price {
            Some(sale) if sale < self.price => sale,
            _ => self.price,
        }
    }

    /// Whether the product is currently discounted.
    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.sale_price.is_some_and(|sale| sale < self.price)
    }

    /// Labels of sizes that can be bought right now.
    pub fn available_sizes(&self) -> impl Iterator<Item = &str> {
        self.sizes
            .iter()
            .filter(|s| s.available)
            .map(|s| s.size.as_str())
    }

    /// Look up a size option by label.
    #[must_use]
    pub fn size(&self, label: &str) -> Option<&SizeOption> {
        self.sizes.iter().find(|s| s.size == label)
    }

    /// Whether the product comes in `color`.
    #[must_use]
    pub fn has_color(&self, color: &str) -> bool {
        self.colors.iter().any(|c| c == color)
    }

    /// Whether `color` has been marked sold out.
    #[must_use]
    pub fn is_color_sold_out(&self, color: &str) -> bool {
        self.sold_out_colors.iter().any(|c| c == color)
    }

    /// The gallery images registered for `color`, if any.
    #[must_use]
    pub fn gallery_for(&self, color: &str) -> &[String] {
        self.color_images
            .iter()
            .find(|g| g.color == color)
            .map(|g| g.images.as_slice())
            .unwrap_or_default()
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

    #[test]
    fn test_single_color_becomes_list() {
        let p = product(json!({"id": 1, "title": "Remera", "price": 100, "color": "Negro"}));
        assert_eq!(p.colors, vec!["Negro".to_string()]);
    }

    #[test]
    fn test_color_list_keeps_order() {
        let p = product(json!({"id": 1, "price": 100, "color": ["Rojo", " ", "Azul"]}));
        assert_eq!(p.colors, vec!["Rojo".to_string(), "Azul".to_string()]);
    }

    #[test]
    fn test_sizes_data_preferred_over_legacy() {
        let p = product(json!({
            "id": "p1",
            "price": 100,
            "sizes_data": [{"size": "S", "available": false}, {"size": "M", "available": true}],
            "size": "XL"
        }));
        assert_eq!(
            p.sizes,
            vec![SizeOption::new("S", false), SizeOption::new("M", true)]
        );
        assert_eq!(p.available_sizes().collect::<Vec<_>>(), vec!["M"]);
    }

    #[test]
    fn test_blank_sizes_data_falls_back_to_legacy() {
        let p = product(json!({
            "id": 1, "title": "Remera", "price": 100,
            "sizes_data": [{"size": " ", "available": true}, {"size": "", "available": false}],
            "size": "XS, S"
        }));
        assert_eq!(p.available_sizes().collect::<Vec<_>>(), vec!["XS", "S"]);
    }

    #[test]
    fn test_legacy_sizes_all_available() {
        let p = product(json!({"id": "p1", "price": 100, "size": "S, M,,L "}));
        assert_eq!(p.available_sizes().collect::<Vec<_>>(), vec!["S", "M", "L"]);
    }

    #[test]
    fn test_empty_sizes_data_falls_back_to_legacy() {
        let p = product(json!({"id": "p1", "price": 100, "sizes_data": [], "size": "U"}));
        assert_eq!(p.sizes, vec![SizeOption::new("U", true)]);
    }

    #[test]
    fn test_no_size_information() {
        let p = product(json!({"id": "p1", "price": 100}));
        assert!(p.sizes.is_empty());
    }

    #[test]
    fn test_malformed_fields_default() {
        let p = product(json!({
            "id": "p1",
            "title": null,
            "price": "not a number",
            "color": 12,
            "sizes_data": "oops",
            "stock": null,
            "sold": "yes"
        }));
        assert_eq!(p.title, "");
        assert_eq!(p.price, Price::ZERO);
        assert!(p.colors.is_empty());
        assert!(p.sizes.is_empty());
        assert!(!p.sold);
    }

    #[test]
    fn test_effective_price() {
        let regular = product(json!({"id": "a", "price": 100}));
        assert_eq!(regular.effective_price(), Price::from(100));
        assert!(!regular.has_discount());

        let sale = product(json!({"id": "b", "price": 100, "sale_price": 60}));
        assert_eq!(sale.effective_price(), Price::from(60));
        assert!(sale.has_discount());

        let bogus_sale = product(json!({"id": "c", "price": 100, "sale_price": 100}));
        assert_eq!(bogus_sale.effective_price(), Price::from(100));
        assert!(!bogus_sale.has_discount());
    }

    #[test]
    fn test_gallery_lookup() {
        let p = product(json!({
            "id": "p1",
            "price": 100,
            "color_images": [{"color": "Rojo", "images": ["r1.jpg", "r2.jpg"]}]
        }));
        assert_eq!(p.gallery_for("Rojo").len(), 2);
        assert!(p.gallery_for("Verde").is_empty());
    }

    #[test]
    fn test_normalized_product_round_trips() {
        let p = product(json!({"id": 3, "price": "49.90", "color": "Negro", "size": "M,L"}));
        let again: Product = serde_json::from_value(serde_json::to_value(&p).unwrap()).unwrap();
        assert_eq!(p, again);
    }
}
