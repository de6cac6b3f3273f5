//! Checkout and payment route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use wear_with_pride_core::{Email, OrderId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::routes::ApiJson;
use crate::routes::orders::OrderView;
use crate::services::checkout::{CheckoutReceipt, CheckoutRequest, Confirmation};
use crate::state::AppState;
use crate::store::UserStore;

/// Turn the caller's cart into an unpaid order.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutReceipt>)> {
    let receipt = state.checkout().create_checkout(user.id, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    pub order_id: OrderId,
    /// Billing email; the account email when absent.
    #[serde(default)]
    pub email: Option<Email>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    pub authorization_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
    pub reference: String,
}

/// Open a Paystack transaction for one of the caller's orders.
#[instrument(skip(state, user, request), fields(user_id = %user.id, order_id = %request.order_id))]
pub async fn initialize(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<InitializeRequest>,
) -> Result<Json<InitializeResponse>> {
    let email = request.email.unwrap_or_else(|| user.email.clone());
    let authorization = state
        .checkout()
        .initialize_payment(user.id, request.order_id, email)
        .await?;

    Ok(Json(InitializeResponse {
        authorization_url: authorization.authorization_url,
        access_code: authorization.access_code,
        reference: authorization.reference,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub reference: String,
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub message: &'static str,
    pub order: OrderView,
}

/// Confirm a payment the client reports as complete.
#[instrument(skip(state, user, request), fields(user_id = %user.id, order_id = %request.order_id))]
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let confirmation = state
        .checkout()
        .verify_payment(user.id, request.order_id, request.reference.trim())
        .await?;

    let message = match &confirmation {
        Confirmation::Applied(order) => {
            spawn_receipt(&state, order.clone(), Some(user.email.as_str()));
            "Payment verified"
        }
        Confirmation::AlreadyPaid(_) => "Payment already verified",
    };

    Ok(Json(VerifyResponse {
        message,
        order: confirmation.into_order().into(),
    }))
}

/// Send the order receipt in the background when mail is configured.
///
/// The recipient is the account email, else `fallback_email`. Failures are
/// logged and never reach the caller.
pub(crate) fn spawn_receipt(state: &AppState, order: Order, fallback_email: Option<&str>) {
    if state.email().is_none() {
        return;
    }
    let state = state.clone();
    let fallback_email = fallback_email.map(String::from);

    tokio::spawn(async move {
        let Some(mailer) = state.email() else {
            return;
        };
        let user = match state.store().user(order.user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Could not load receipt recipient");
                None
            }
        };

        let name = user.as_ref().map_or("", |u| u.name.as_str());
        let Some(to) = user
            .as_ref()
            .map(|u| u.email.as_str().to_string())
            .or(fallback_email)
        else {
            tracing::debug!(order_id = %order.id, "No address for receipt");
            return;
        };

        let currency = state.config().paystack.currency;
        if let Err(e) = mailer.send_order_receipt(&to, name, &order, currency).await {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to send order receipt");
        }
    });
}
