//! `tienda favorites ...`.

use std::fmt::Write as _;

use tienda_core::ProductId;
use tienda_storefront::favorites::{FavoriteItem, FavoriteToggle, FavoritesManager, UserContact};
use tienda_storefront::storage::FileStorage;

use super::{CliError, Context};

fn load(ctx: &Context) -> FavoritesManager<FileStorage> {
    FavoritesManager::load(ctx.store(), ctx.leads())
}

/// Save or remove a favorite.
///
/// # Errors
///
/// Returns error if the product is unknown.
pub async fn toggle(ctx: &Context, product_id: &ProductId) -> Result<String, CliError> {
    let product = ctx.product(product_id).await?;
    let mut favorites = load(ctx);
    let status = favorites.toggle(FavoriteItem::from_product(&product));
    let verb = match status {
        FavoriteToggle::Saved => "Saved",
        FavoriteToggle::Removed => "Removed",
    };
    Ok(format!(
        "{verb} {} ({} favorites)\n",
        product.title,
        favorites.items().len()
    ))
}

/// Store the contact and submit every favorite as a lead.
///
/// # Errors
///
/// Returns error if both fields are blank or either is malformed.
pub fn save_contact(
    ctx: &Context,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<String, CliError> {
    let contact = UserContact::parse(email, phone)?;
    let mut favorites = load(ctx);
    favorites.save_user_contact(contact);
    Ok(format!(
        "Contact saved, {} favorites submitted\n",
        favorites.items().len()
    ))
}

#[must_use]
pub fn show(ctx: &Context) -> String {
    let favorites = load(ctx);
    let mut out = String::new();
    for item in favorites.items() {
        let _ = writeln!(out, "{}\t{}\t{}\t{}", item.id, item.title, item.price, item.category);
    }
    match favorites.contact() {
        Some(contact) => {
            let email = contact.email.as_ref().map_or("-", |e| e.as_str());
            let phone = contact.phone.as_ref().map_or("-", |p| p.as_str());
            let _ = writeln!(out, "contact: {email} / {phone}");
        }
        None => out.push_str("contact: none\n"),
    }
    out
}
