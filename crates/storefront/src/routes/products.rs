//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tienda_core::{Price, Product, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::{CatalogFacets, FilterCriteria, SortOrder, filter_products};
use crate::error::Result;
use crate::state::AppState;
use crate::variants::{VariantOption, VariantResolver, VariantSelection};

/// Catalog query parameters. `size` and `color` take comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub size: Option<String>,
    pub color: Option<String>,
    pub max_price: Option<Decimal>,
    pub sort: Option<SortOrder>,
    pub category: Option<String>,
}

impl CatalogQuery {
    fn criteria(self) -> FilterCriteria {
        FilterCriteria {
            sizes: split_list(self.size.as_deref()),
            colors: split_list(self.color.as_deref()),
            max_price: self.max_price.map(Price::new),
            sort: self.sort.unwrap_or_default(),
            category: self.category.filter(|c| !c.trim().is_empty()),
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Catalog listing.
#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub products: Vec<Product>,
    pub total: usize,
    /// Options across the whole catalog, for the filter controls.
    pub facets: CatalogFacets,
}

/// Filtered, sorted catalog.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogView>> {
    let products = state.backend().list_products().await?;
    let criteria = query.criteria();

    let matched: Vec<Product> = filter_products(&products, &criteria)
        .into_iter()
        .cloned()
        .collect();
    tracing::debug!(matched = matched.len(), of = products.len(), "Catalog filtered");

    Ok(Json(CatalogView {
        total: matched.len(),
        facets: CatalogFacets::collect(&products),
        products: matched,
    }))
}

/// Detail query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    /// Preselect this color (e.g. coming from a color swatch on the listing).
    pub color: Option<String>,
}

/// Product detail with everything the variant picker needs.
#[derive(Debug, Serialize)]
pub struct ProductDetailView {
    pub product: Product,
    pub selection: VariantSelection,
    pub images: Vec<String>,
    pub colors: Vec<VariantOption>,
    pub sizes: Vec<VariantOption>,
    pub is_favorite: bool,
}

/// Product detail page data.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<ProductDetailView>> {
    let id = ProductId::new(id);
    let product = state.backend().get_product(&id).await?;

    let favorites = super::load_favorites(session, state.leads().clone()).await;
    let is_favorite = favorites.is_favorite(&id);

    let selection = VariantSelection::with_color(&product, query.color.as_deref());
    let resolver = VariantResolver::new(&product);
    let images = resolver
        .active_images(&selection.color)
        .into_iter()
        .map(String::from)
        .collect();
    let colors = resolver.color_options();
    let sizes = resolver.size_options();

    Ok(Json(ProductDetailView {
        selection,
        images,
        colors,
        sizes,
        is_favorite,
        product,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_to_criteria() {
        let query = CatalogQuery {
            size: Some("M, L,".to_string()),
            color: Some("Negro".to_string()),
            max_price: Some(Decimal::new(80, 0)),
            sort: Some(SortOrder::PriceAsc),
            category: Some("  ".to_string()),
        };
        let criteria = query.criteria();
        assert_eq!(criteria.sizes, vec!["M", "L"]);
        assert_eq!(criteria.colors, vec!["Negro"]);
        assert_eq!(criteria.max_price, Some(Price::from(80)));
        assert_eq!(criteria.sort, SortOrder::PriceAsc);
        assert_eq!(criteria.category, None);
    }

    #[test]
    fn test_empty_query_is_no_filter() {
        assert_eq!(CatalogQuery::default().criteria(), FilterCriteria::default());
    }
}
