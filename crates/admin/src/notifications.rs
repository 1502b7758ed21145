//! Price-drop notifications.
//!
//! When an update lowers a product's effective price, everyone who left
//! their email while favoriting it gets one message. Recipients go in `Bcc`
//! so leads never see each other's addresses.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tienda_core::{Email, Price, Product, ProductId};
use tracing::instrument;

use crate::backend::AdminBackend;
use crate::config::EmailConfig;

#[derive(Template)]
#[template(path = "email/price_drop.html")]
struct PriceDropEmailHtml<'a> {
    title: &'a str,
    previous: Price,
    current: Price,
    image_url: Option<&'a str>,
    product_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/price_drop.txt")]
struct PriceDropEmailText<'a> {
    title: &'a str,
    previous: Price,
    current: Price,
    product_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A product whose effective price went down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceDrop {
    pub product_id: ProductId,
    pub title: String,
    pub previous: Price,
    pub current: Price,
    pub image_url: Option<String>,
}

impl PriceDrop {
    /// Compare a product before and after an update.
    ///
    /// Returns `Some` only when the new effective price is strictly lower.
    #[must_use]
    pub fn detect(previous: &Product, updated: &Product) -> Option<Self> {
        let before = previous.effective_price();
        let after = updated.effective_price();
        (after < before).then(|| Self {
            product_id: updated.id.clone(),
            title: updated.title.clone(),
            previous: before,
            current: after,
            image_url: updated.image_url.clone(),
        })
    }

    #[must_use]
    pub fn subject(&self) -> String {
        format!("¡{} bajó de precio!", self.title)
    }

    /// Link to the product on the storefront.
    #[must_use]
    pub fn product_url(&self, storefront_url: &str) -> String {
        format!(
            "{}/products/{}",
            storefront_url.trim_end_matches('/'),
            urlencoding::encode(self.product_id.as_str())
        )
    }

    /// Render the plain text and HTML bodies.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn render(&self, storefront_url: &str) -> Result<(String, String), EmailError> {
        let product_url = self.product_url(storefront_url);
        let text = PriceDropEmailText {
            title: &self.title,
            previous: self.previous,
            current: self.current,
            product_url: &product_url,
        }
        .render()?;
        let html = PriceDropEmailHtml {
            title: &self.title,
            previous: self.previous,
            current: self.current,
            image_url: self.image_url.as_deref(),
            product_url: &product_url,
        }
        .render()?;
        Ok((text, html))
    }
}

/// Email service for price-drop notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: Mailbox,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid or the from address does
    /// not parse.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        let from_address = config
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(config.from_address.clone()))?;

        Ok(Self {
            mailer,
            from_address,
        })
    }

    /// Build a multipart message addressed to the sender with every
    /// recipient in `Bcc`.
    ///
    /// # Errors
    ///
    /// Returns error if a recipient address is rejected or the message
    /// cannot be built.
    pub fn build_message(
        &self,
        recipients: &[Email],
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.from_address.clone())
            .to(self.from_address.clone())
            .subject(subject);

        for recipient in recipients {
            let mailbox: Mailbox = recipient
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(recipient.to_string()))?;
            builder = builder.bcc(mailbox);
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
        )?;
        Ok(message)
    }

    /// Send one message to every recipient.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or the relay rejects it.
    #[instrument(skip(self, recipients, text_body, html_body), fields(recipients = recipients.len()))]
    pub async fn send(
        &self,
        recipients: &[Email],
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let message = self.build_message(recipients, subject, text_body, html_body)?;
        self.mailer.send(message).await?;
        tracing::info!(subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Email the leads of a product whose price dropped.
///
/// Never fails: the product update has already been stored, so lookup,
/// render and delivery problems are logged. Returns how many leads were
/// emailed.
#[instrument(skip_all, fields(product_id = %price_drop.product_id))]
pub async fn notify_price_drop(
    email: Option<&EmailService>,
    backend: &AdminBackend,
    storefront_url: &str,
    price_drop: &PriceDrop,
) -> usize {
    let Some(email) = email else {
        tracing::debug!("Email disabled, skipping price-drop notification");
        return 0;
    };

    let recipients = match backend.favorite_emails(&price_drop.product_id).await {
        Ok(recipients) if recipients.is_empty() => {
            tracing::debug!("No leads to notify");
            return 0;
        }
        Ok(recipients) => recipients,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load leads for price drop");
            return 0;
        }
    };

    let (text, html) = match price_drop.render(storefront_url) {
        Ok(bodies) => bodies,
        Err(e) => {
            tracing::error!(error = %e, "Failed to render price-drop email");
            return 0;
        }
    };

    match email.send(&recipients, &price_drop.subject(), &text, &html).await {
        Ok(()) => {
            tracing::info!(
                recipients = recipients.len(),
                previous = %price_drop.previous,
                current = %price_drop.current,
                "Price-drop notification sent"
            );
            recipients.len()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to send price-drop notification");
            0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn product(price: u32, sale: Option<u32>) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": "p1",
            "title": "Campera <Rompevientos>",
            "price": price,
            "sale_price": sale,
        }))
        .unwrap()
    }

    fn service() -> EmailService {
        EmailService::new(&EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("smtp-password"),
            from_address: "Tienda <hola@tienda.com>".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_detect_requires_strict_decrease() {
        assert!(PriceDrop::detect(&product(100, None), &product(100, None)).is_none());
        assert!(PriceDrop::detect(&product(100, None), &product(120, None)).is_none());

        let drop = PriceDrop::detect(&product(100, None), &product(100, Some(80))).unwrap();
        assert_eq!(drop.previous, Price::from(100_u32));
        assert_eq!(drop.current, Price::from(80_u32));
    }

    #[test]
    fn test_detect_uses_effective_price() {
        // Removing a sale raises the price even if the base price went down.
        assert!(PriceDrop::detect(&product(100, Some(60)), &product(90, None)).is_none());
        // A sale at or above the base price does not count.
        assert!(PriceDrop::detect(&product(100, None), &product(100, Some(100))).is_none());
    }

    #[test]
    fn test_render_escapes_html() {
        let drop = PriceDrop::detect(&product(100, None), &product(100, Some(75))).unwrap();
        let (text, html) = drop.render("https://tienda.com/").unwrap();

        assert!(text.contains("Campera <Rompevientos>"));
        assert!(text.contains("$75.00"));
        assert!(text.contains("https://tienda.com/products/p1"));
        assert!(html.contains("Campera &#60;Rompevientos&#62;") || html.contains("&lt;Rompevientos&gt;"));
        assert!(!html.contains("<Rompevientos>"));
    }

    // The SMTP transport must be dropped inside a runtime.
    #[tokio::test]
    async fn test_recipients_are_blind_copied() {
        let recipients = vec![
            Email::parse("ana@mail.com").unwrap(),
            Email::parse("luis@mail.com").unwrap(),
        ];
        let message = service()
            .build_message(&recipients, "Oferta", "texto", "<p>html</p>")
            .unwrap();

        let envelope: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(envelope.contains(&"ana@mail.com".to_string()));
        assert!(envelope.contains(&"luis@mail.com".to_string()));

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(!formatted.contains("ana@mail.com"));
        assert!(formatted.contains("hola@tienda.com"));
    }
}
