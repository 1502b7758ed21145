//! WhatsApp checkout.
//!
//! There is no payment step: the cart becomes a plain-text order message and
//! the shopper is sent to a `wa.me` link that opens a chat with the store
//! with that message prefilled.

use std::fmt::Write as _;

use thiserror::Error;
use tienda_core::Phone;

use crate::cart::Cart;

/// Checkout errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,
}

/// A prepared WhatsApp order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppOrder {
    pub message: String,
    pub link: String,
}

/// Render the order message for `cart`.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] if there is nothing to order.
pub fn order_message(cart: &Cart) -> Result<String, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut message = String::from("Hola! Quiero hacer este pedido:\n\n");
    for line in cart.lines() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            message,
            "- {} (Talle: {}, Color: {}) x{} = {}",
            line.title,
            line.size,
            line.color,
            line.quantity,
            line.subtotal()
        );
    }
    let _ = write!(message, "\nTotal: {}", cart.total());
    Ok(message)
}

/// Build the message and the `https://wa.me/{digits}?text=...` link.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] if there is nothing to order.
pub fn whatsapp_order(cart: &Cart, phone: &Phone) -> Result<WhatsAppOrder, CheckoutError> {
    let message = order_message(cart)?;
    let link = format!(
        "https://wa.me/{}?text={}",
        phone.digits(),
        urlencoding::encode(&message)
    );
    tracing::info!(lines = cart.lines().len(), total = %cart.total(), "WhatsApp order prepared");
    Ok(WhatsAppOrder { message, link })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tienda_core::{Price, ProductId};

    use super::*;
    use crate::cart::CartLine;

    fn cart() -> Cart {
        let mut cart = Cart::default();
        let id = ProductId::new("p1");
        let line = CartLine {
            key: CartLine::key_for(&id, "M", "Negro"),
            product_id: id,
            title: "Remera".to_string(),
            price: Price::from_cents(2500),
            image: None,
            size: "M".to_string(),
            color: "Negro".to_string(),
            quantity: 1,
        };
        cart.add(line.clone());
        cart.add(line);
        cart
    }

    #[test]
    fn test_empty_cart_rejected() {
        let phone = Phone::parse("+54 9 11 5555-0000").unwrap();
        assert_eq!(
            whatsapp_order(&Cart::default(), &phone),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_message_lists_lines_and_total() {
        let message = order_message(&cart()).unwrap();
        assert!(message.contains("- Remera (Talle: M, Color: Negro) x2 = $50.00"));
        assert!(message.ends_with("Total: $50.00"));
    }

    #[test]
    fn test_link_uses_digits_and_encodes_text() {
        let phone = Phone::parse("+54 9 11 5555-0000").unwrap();
        let order = whatsapp_order(&cart(), &phone).unwrap();
        assert!(order.link.starts_with("https://wa.me/5491155550000?text="));
        assert!(!order.link.contains(' '));
        assert!(!order.link.contains('\n'));
        assert!(order.link.contains("Remera"));
    }
}
