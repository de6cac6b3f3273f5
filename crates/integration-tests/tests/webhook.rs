//! Signed Paystack deliveries through the HTTP router.

#![allow(clippy::unwrap_used)]

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use wear_with_pride_api::services::paystack::{SIGNATURE_HEADER, WebhookVerifier};
use wear_with_pride_api::store::OrderStore;
use wear_with_pride_api::testing::TEST_PAYSTACK_SECRET;
use wear_with_pride_core::OrderId;
use wear_with_pride_integration_tests::{BUYER, CAP, Shop, TEE, paystack_checkout};

fn payload(event: &str, order_id: OrderId) -> Vec<u8> {
    json!({
        "event": event,
        "data": {
            "reference": format!("order_{order_id}_1772366400000"),
            "status": "success",
            "amount": 250_000,
            "metadata": { "orderId": order_id.to_string() }
        }
    })
    .to_string()
    .into_bytes()
}

fn sign(body: &[u8]) -> String {
    WebhookVerifier::new(SecretString::from(TEST_PAYSTACK_SECRET))
        .sign(body)
        .unwrap()
}

async fn deliver(shop: &Shop, path: &str, body: Vec<u8>, signature: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap();
    let response = shop.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn pending_order(shop: &Shop) -> OrderId {
    shop.fill_cart(&[(TEE, 2), (CAP, 1)]).await;
    shop.checkout()
        .create_checkout(BUYER, paystack_checkout())
        .await
        .unwrap()
        .order_id
}

#[tokio::test]
async fn test_same_delivery_twice_on_both_paths() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;
    let body = payload("charge.success", order_id);
    let signature = sign(&body);

    let (status, _) = deliver(&shop, "/api/checkout/webhook", body.clone(), &signature).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = deliver(
        &shop,
        "/api/checkout/paystack/webhook",
        body,
        &signature,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(shop.store.stock(TEE).await, Some(3));
    assert_eq!(shop.store.stock(CAP).await, Some(2));
    assert_eq!(shop.store.cart_deletes(), 1);
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;
    let body = payload("charge.success", order_id);
    let signature = sign(&body);

    let tampered = String::from_utf8(body)
        .unwrap()
        .replace("250000", "100")
        .into_bytes();
    let (status, response) = deliver(&shop, "/api/checkout/webhook", tampered, &signature).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["message"], "Invalid signature");
    assert!(!shop.store.order(order_id).await.unwrap().unwrap().is_paid());
}

#[tokio::test]
async fn test_paid_order_webhook_changes_nothing() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;
    shop.checkout()
        .confirm_payment(order_id, "order_1_1")
        .await
        .unwrap();
    assert_eq!(shop.store.stock(TEE).await, Some(3));

    let body = payload("charge.success", order_id);
    let signature = sign(&body);
    let (status, _) = deliver(&shop, "/api/checkout/webhook", body, &signature).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(shop.store.stock(TEE).await, Some(3));
    let order = shop.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_reference.as_deref(), Some("order_1_1"));
}

#[tokio::test]
async fn test_other_events_are_acknowledged() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;
    let body = payload("charge.failed", order_id);
    let signature = sign(&body);

    let (status, _) = deliver(&shop, "/api/checkout/webhook", body, &signature).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!shop.store.order(order_id).await.unwrap().unwrap().is_paid());
}

#[tokio::test]
async fn test_charge_without_reference_records_order_reference() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;
    let body = json!({
        "event": "charge.success",
        "data": { "status": "success", "metadata": { "orderId": order_id.to_string() } }
    })
    .to_string()
    .into_bytes();
    let signature = sign(&body);

    let (status, response) = deliver(&shop, "/api/checkout/webhook", body, &signature).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "Payment confirmed");
    let order = shop.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(
        order.payment_reference,
        Some(format!("order_{order_id}"))
    );
}
