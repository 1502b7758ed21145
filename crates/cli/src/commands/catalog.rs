//! `tienda catalog` - filter the product list.

use std::fmt::Write as _;

use tienda_core::Product;
use tienda_storefront::catalog::{CatalogFacets, FilterCriteria, filter_products};

use super::{CliError, Context};

/// Filter the catalog and render one product per line, followed by the
/// filter options the full catalog offers.
///
/// # Errors
///
/// Returns error if the products cannot be loaded.
pub async fn list(ctx: &Context, criteria: &FilterCriteria) -> Result<String, CliError> {
    let products = ctx.products().await?;
    let matched = filter_products(&products, criteria);
    tracing::debug!(total = products.len(), matched = matched.len(), "Catalog filtered");

    let mut out = String::new();
    for product in &matched {
        let _ = writeln!(out, "{}", product_line(product));
    }
    let _ = writeln!(out, "{} of {} products", matched.len(), products.len());

    let facets = CatalogFacets::collect(&products);
    let _ = writeln!(out, "sizes: {}", facets.sizes.join(", "));
    let _ = writeln!(out, "colors: {}", facets.colors.join(", "));
    let _ = writeln!(out, "max price: {}", facets.max_price);
    Ok(out)
}

fn product_line(product: &Product) -> String {
    let price = if product.has_discount() {
        format!("{} (was {})", product.effective_price(), product.price)
    } else {
        product.effective_price().to_string()
    };
    let sizes: Vec<&str> = product.available_sizes().collect();
    format!(
        "{}\t{}\t{}\t[{}]\t[{}]",
        product.id,
        product.title,
        price,
        sizes.join(", "),
        product.colors.join(", ")
    )
}
