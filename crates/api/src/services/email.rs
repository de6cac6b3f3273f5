//! Transactional email.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and text templates.
//! Sending is best effort: callers log failures and never fail a request
//! because mail could not go out.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use wear_with_pride_core::CurrencyCode;

use crate::config::EmailConfig;
use crate::models::{Order, ShippingAddress};

/// One purchased line, preformatted for the templates.
struct ReceiptLine {
    name: String,
    quantity: u32,
    total: String,
}

/// HTML template for the order receipt.
#[derive(Template)]
#[template(path = "email/order_receipt.html")]
struct OrderReceiptHtml<'a> {
    name: &'a str,
    order_id: String,
    lines: &'a [ReceiptLine],
    total: String,
    currency: &'a str,
    reference: &'a str,
    address: String,
}

/// Plain text template for the order receipt.
#[derive(Template)]
#[template(path = "email/order_receipt.txt")]
struct OrderReceiptText<'a> {
    name: &'a str,
    order_id: String,
    lines: &'a [ReceiptLine],
    total: String,
    currency: &'a str,
    reference: &'a str,
    address: String,
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

/// Rendered receipt bodies.
#[derive(Debug)]
pub struct RenderedReceipt {
    pub subject: String,
    pub text: String,
    pub html: String,
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

fn one_line_address(address: &ShippingAddress) -> String {
    [
        address.address.as_str(),
        address.city.as_str(),
        address.postal_code.as_str(),
        address.country.as_str(),
    ]
    .into_iter()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Render the receipt for a paid order.
///
/// # Errors
///
/// Returns `Template` if rendering fails.
pub fn render_order_receipt(
    name: &str,
    order: &Order,
    currency: CurrencyCode,
) -> Result<RenderedReceipt, EmailError> {
    let lines: Vec<ReceiptLine> = order
        .items
        .iter()
        .map(|item| ReceiptLine {
            name: item.name.clone(),
            quantity: item.quantity,
            total: money(item.line_total()),
        })
        .collect();
    let reference = order.payment_reference.as_deref().unwrap_or("-");
    let address = one_line_address(&order.shipping_address);

    let html = OrderReceiptHtml {
        name,
        order_id: order.id.to_string(),
        lines: &lines,
        total: money(order.total_amount),
        currency: currency.code(),
        reference,
        address: address.clone(),
    }
    .render()?;
    let text = OrderReceiptText {
        name,
        order_id: order.id.to_string(),
        lines: &lines,
        total: money(order.total_amount),
        currency: currency.code(),
        reference,
        address,
    }
    .render()?;

    Ok(RenderedReceipt {
        subject: format!("Your Wear With Pride order #{} is confirmed", order.id),
        text,
        html,
    })
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the receipt for a paid order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_receipt(
        &self,
        to: &str,
        name: &str,
        order: &Order,
        currency: CurrencyCode,
    ) -> Result<(), EmailError> {
        let receipt = render_order_receipt(name, order, currency)?;
        self.send_multipart_email(to, &receipt.subject, &receipt.text, &receipt.html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
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

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}
