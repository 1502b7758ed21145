//! Catalog filtering.
//!
//! [`filter_products`] is a pure function of the product list and the
//! shopper's [`FilterCriteria`]: price gate, then size, color and category
//! gates (each skipped when nothing is selected), then a stable sort.

use serde::{Deserialize, Serialize};
use tienda_core::{Price, Product};

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Keep the order the backend returned.
    #[default]
    Insertion,
    /// Cheapest effective price first.
    PriceAsc,
    /// Most expensive effective price first.
    PriceDesc,
}

/// What the shopper picked in the filter sidebar. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    /// Inclusive upper bound on effective price; `None` means no ceiling.
    pub max_price: Option<Price>,
    pub sort: SortOrder,
    /// Case-insensitive category match.
    pub category: Option<String>,
}

/// Products passing every gate in `criteria`, ordered by `criteria.sort`.
///
/// Ties (and [`SortOrder::Insertion`]) keep input order, so applying the same
/// criteria to the output again yields the same list.
pub fn filter_products<'a, I>(products: I, criteria: &FilterCriteria) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    let mut matched: Vec<&Product> = products
        .into_iter()
        .filter(|p| matches(p, criteria))
        .collect();

    match criteria.sort {
        SortOrder::Insertion => {}
        SortOrder::PriceAsc => matched.sort_by_key(|p| p.effective_price()),
        SortOrder::PriceDesc => {
            matched.sort_by(|a, b| b.effective_price().cmp(&a.effective_price()));
        }
    }
    matched
}

fn matches(product: &Product, criteria: &FilterCriteria) -> bool {
    let price = product.effective_price();
    if price.is_negative() || criteria.max_price.is_some_and(|max| price > max) {
        return false;
    }

    if !criteria.sizes.is_empty()
        && !product
            .available_sizes()
            .any(|size| criteria.sizes.iter().any(|s| s == size))
    {
        return false;
    }

    if !criteria.colors.is_empty() && !criteria.colors.iter().any(|c| product.has_color(c)) {
        return false;
    }

    if let Some(category) = &criteria.category
        && !product.category.eq_ignore_ascii_case(category)
    {
        return false;
    }

    true
}

/// Options to offer in the filter controls for a given product list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogFacets {
    /// Available sizes, first-seen order.
    pub sizes: Vec<String>,
    /// Colors, first-seen order.
    pub colors: Vec<String>,
    /// Highest effective price; the default for the price slider.
    pub max_price: Price,
}

impl CatalogFacets {
    #[must_use]
    pub fn collect<'a, I>(products: I) -> Self
    where
        I: IntoIterator<Item = &'a Product>,
    {
        let mut facets = Self::default();
        for product in products {
            for size in product.available_sizes() {
                if !facets.sizes.iter().any(|s| s == size) {
                    facets.sizes.push(size.to_owned());
                }
            }
            for color in &product.colors {
                if !facets.colors.contains(color) {
                    facets.colors.push(color.clone());
                }
            }
            facets.max_price = facets.max_price.max(product.effective_price());
        }
        facets
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

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    fn sample() -> Vec<Product> {
        vec![
            product(json!({"id": "a", "price": 100, "color": "Negro", "size": "S,M", "category": "Remeras"})),
            product(json!({"id": "b", "price": 100, "sale_price": 60, "color": ["Rojo", "Negro"],
                "sizes_data": [{"size": "S", "available": false}, {"size": "M", "available": true}],
                "category": "Remeras"})),
            product(json!({"id": "c", "price": 40, "color": "Azul", "category": "Jeans"})),
            product(json!({"id": "d", "price": 60, "color": "Blanco", "size": "L", "category": "remeras"})),
        ]
    }

    #[test]
    fn test_no_criteria_keeps_everything_in_order() {
        let products = sample();
        let result = filter_products(&products, &FilterCriteria::default());
        assert_eq!(ids(&result), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_price_ceiling_uses_effective_price() {
        let products = vec![
            product(json!({"id": "A", "price": 100})),
            product(json!({"id": "B", "price": 100, "sale_price": 60})),
        ];
        let criteria = FilterCriteria {
            max_price: Some(Price::from(80)),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_products(&products, &criteria)), vec!["B"]);
    }

    #[test]
    fn test_price_ceiling_is_inclusive() {
        let products = vec![product(json!({"id": "x", "price": "80.00"}))];
        let at = FilterCriteria {
            max_price: Some(Price::from(80)),
            ..FilterCriteria::default()
        };
        let below = FilterCriteria {
            max_price: Some(Price::from_cents(7999)),
            ..FilterCriteria::default()
        };
        assert_eq!(filter_products(&products, &at).len(), 1);
        assert!(filter_products(&products, &below).is_empty());
    }

    #[test]
    fn test_size_filter_only_counts_available_sizes() {
        let products = sample();
        let criteria = FilterCriteria {
            sizes: vec!["S".to_string()],
            ..FilterCriteria::default()
        };
        // b lists S but it is unavailable; c has no size information at all.
        assert_eq!(ids(&filter_products(&products, &criteria)), vec!["a"]);
    }

    #[test]
    fn test_size_filter_any_match() {
        let products = sample();
        let criteria = FilterCriteria {
            sizes: vec!["M".to_string(), "L".to_string()],
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_products(&products, &criteria)), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_color_filter() {
        let products = sample();
        let criteria = FilterCriteria {
            colors: vec!["Negro".to_string()],
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_products(&products, &criteria)), vec!["a", "b"]);
    }

    #[test]
    fn test_category_filter_ignores_case() {
        let products = sample();
        let criteria = FilterCriteria {
            category: Some("REMERAS".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_products(&products, &criteria)), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_sort_ascending_is_stable() {
        let products = sample();
        let criteria = FilterCriteria {
            sort: SortOrder::PriceAsc,
            ..FilterCriteria::default()
        };
        // b (60 on sale) and d (60) tie and keep input order.
        assert_eq!(ids(&filter_products(&products, &criteria)), vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_sort_descending_is_stable() {
        let products = sample();
        let criteria = FilterCriteria {
            sort: SortOrder::PriceDesc,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_products(&products, &criteria)), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let products = sample();
        let criteria = FilterCriteria {
            colors: vec!["Negro".to_string(), "Blanco".to_string()],
            max_price: Some(Price::from(100)),
            sort: SortOrder::PriceAsc,
            ..FilterCriteria::default()
        };
        let once = filter_products(&products, &criteria);
        let twice = filter_products(once.iter().copied(), &criteria);
        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(ids(&once), ids(&filter_products(&products, &criteria)));
    }

    #[test]
    fn test_negative_price_excluded() {
        let products = vec![product(json!({"id": "neg", "price": -5}))];
        assert!(filter_products(&products, &FilterCriteria::default()).is_empty());
    }

    #[test]
    fn test_facets() {
        let products = sample();
        let facets = CatalogFacets::collect(&products);
        assert_eq!(facets.sizes, vec!["S", "M", "L"]);
        assert_eq!(facets.colors, vec!["Negro", "Rojo", "Azul", "Blanco"]);
        assert_eq!(facets.max_price, Price::from(100));
    }
}
