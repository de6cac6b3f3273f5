//! Paystack webhook receiver.
//!
//! The body is taken as raw bytes: the signature covers the exact bytes
//! Paystack sent, so it is verified before any parsing. After that the
//! handler only answers non-2xx when a retry could help.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::checkout::spawn_receipt;
use crate::services::checkout::{CheckoutError, Confirmation};
use crate::services::paystack::{SIGNATURE_HEADER, WebhookEvent};
use crate::state::AppState;

fn acknowledged(message: &str) -> Json<Value> {
    Json(json!({ "message": message }))
}

/// Handle one webhook delivery.
///
/// - bad or missing signature: 401
/// - unparseable body: 400
/// - events other than `charge.success`, or no order id: 200, ignored
/// - unknown or already-paid order: 200, nothing changes
/// - store failure: 500 so Paystack redelivers
#[instrument(skip_all, fields(event = tracing::field::Empty, order_id = tracing::field::Empty))]
pub async fn paystack(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = state.webhooks().verify(&body, signature) {
        tracing::warn!(error = %e, "Rejected webhook with bad signature");
        return Err(e.into());
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {e}")))?;
    tracing::Span::current().record("event", event.event.as_str());

    let Some(charge) = event.charge_success() else {
        tracing::debug!("Ignoring webhook event");
        return Ok(acknowledged("Event ignored"));
    };
    let Some(order_id) = charge.order_id else {
        tracing::info!("charge.success without order id; ignoring");
        return Ok(acknowledged("Event ignored"));
    };
    tracing::Span::current().record("order_id", tracing::field::display(order_id));

    let reference = charge
        .reference
        .unwrap_or_else(|| format!("order_{order_id}"));

    match state.checkout().confirm_payment(order_id, &reference).await {
        Ok(Confirmation::Applied(order)) => {
            spawn_receipt(&state, order, charge.customer_email.as_deref());
            Ok(acknowledged("Payment confirmed"))
        }
        Ok(Confirmation::AlreadyPaid(_)) => {
            tracing::info!("Duplicate webhook for paid order");
            Ok(acknowledged("Payment already confirmed"))
        }
        Err(CheckoutError::OrderNotFound(_)) => {
            tracing::warn!("Webhook for unknown order");
            Ok(acknowledged("Order not found"))
        }
        Err(e) => Err(e.into()),
    }
}
