//! `tienda cart ...` and `tienda checkout`.

use std::fmt::Write as _;

use tienda_core::{Phone, ProductId};
use tienda_storefront::cart::{CartLine, CartManager};
use tienda_storefront::checkout::whatsapp_order;
use tienda_storefront::storage::FileStorage;
use tienda_storefront::variants::VariantResolver;

use super::{CliError, Context};

fn load(ctx: &Context) -> CartManager<FileStorage> {
    CartManager::load(ctx.store())
}

/// Add one unit of a product. Missing size or color falls back to the
/// product's defaults.
///
/// # Errors
///
/// Returns error if the product is unknown or the variant cannot be bought.
pub async fn add(
    ctx: &Context,
    product_id: &ProductId,
    size: Option<&str>,
    color: Option<&str>,
) -> Result<String, CliError> {
    let product = ctx.product(product_id).await?;
    let chosen = VariantResolver::new(&product).choose(size, color)?;
    let line = CartLine::from_product(&product, &chosen.size, &chosen.color);
    let key = line.key.clone();

    let mut cart = load(ctx);
    cart.add(line);
    let quantity = cart.cart().get(&key).map_or(0, |l| l.quantity);
    Ok(format!("Added {key} (x{quantity})\n{}", summary(&cart)))
}

/// Remove a line. Absent keys are not an error.
#[must_use]
pub fn remove(ctx: &Context, key: &str) -> String {
    let mut cart = load(ctx);
    cart.remove(key);
    summary(&cart)
}

/// Set a line's quantity; zero removes it.
///
/// # Errors
///
/// Returns [`CliError::UnknownLine`] if no line has `key`.
pub fn set_quantity(ctx: &Context, key: &str, quantity: u32) -> Result<String, CliError> {
    let mut cart = load(ctx);
    if !cart.set_quantity(key, quantity) {
        return Err(CliError::UnknownLine(key.to_owned()));
    }
    Ok(summary(&cart))
}

#[must_use]
pub fn clear(ctx: &Context) -> String {
    let mut cart = load(ctx);
    cart.clear();
    summary(&cart)
}

/// Every line with its subtotal, then count and total.
#[must_use]
pub fn show(ctx: &Context) -> String {
    let cart = load(ctx);
    let mut out = String::new();
    for line in cart.cart().lines() {
        let _ = writeln!(
            out,
            "{}\t{} ({} / {})\tx{}\t{}",
            line.key,
            line.title,
            line.size,
            line.color,
            line.quantity,
            line.subtotal()
        );
    }
    out.push_str(&summary(&cart));
    out
}

/// The WhatsApp order message and link for the current cart.
///
/// # Errors
///
/// Returns error if the cart is empty.
pub fn checkout(ctx: &Context, phone: &Phone) -> Result<String, CliError> {
    let cart = load(ctx);
    let order = whatsapp_order(cart.cart(), phone)?;
    Ok(format!("{}\n\n{}\n", order.message, order.link))
}

fn summary(cart: &CartManager<FileStorage>) -> String {
    format!("{} items, total {}\n", cart.count(), cart.total())
}
