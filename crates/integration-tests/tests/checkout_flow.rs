//! Cart to paid order through the checkout service.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;

use wear_with_pride_api::services::checkout::{CheckoutError, CheckoutRequest};
use wear_with_pride_api::store::{CartStore, OrderStore};
use wear_with_pride_core::{PaymentMethod, PaymentStatus};
use wear_with_pride_integration_tests::{
    BUYER, CAP, Shop, TEE, lagos_address, paystack_checkout,
};

#[tokio::test]
async fn test_checkout_totals_cart_and_defers_effects() {
    let shop = Shop::seeded().await;
    shop.fill_cart(&[(TEE, 2), (CAP, 1)]).await;

    let receipt = shop
        .checkout()
        .create_checkout(BUYER, paystack_checkout())
        .await
        .unwrap();

    assert_eq!(receipt.amount, Decimal::new(2500, 0));
    let order = shop.store.order(receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].name, "Pride Tee");
    assert_eq!(order.shipping_address, lagos_address());

    assert_eq!(shop.store.stock(TEE).await, Some(5));
    assert_eq!(shop.store.stock(CAP).await, Some(3));
    assert!(shop.store.cart(BUYER).await.unwrap().is_some());
}

#[tokio::test]
async fn test_pay_on_delivery_starts_not_paid() {
    let shop = Shop::seeded().await;
    shop.fill_cart(&[(CAP, 1)]).await;

    let receipt = shop
        .checkout()
        .create_checkout(
            BUYER,
            CheckoutRequest {
                payment_method: Some(PaymentMethod::PayOnDelivery),
                shipping_address: lagos_address(),
            },
        )
        .await
        .unwrap();

    let order = shop.store.order(receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::NotPaid);
}

#[tokio::test]
async fn test_any_short_line_blocks_the_whole_order() {
    let shop = Shop::seeded().await;
    shop.fill_cart(&[(TEE, 1), (CAP, 4)]).await;

    let err = shop
        .checkout()
        .create_checkout(BUYER, paystack_checkout())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock { product_id, requested: 4, available: 3, .. }
            if product_id == CAP
    ));
    assert!(shop.store.all_orders().await.is_empty());
}

#[tokio::test]
async fn test_price_change_after_add_keeps_cart_price() {
    let shop = Shop::seeded().await;
    shop.fill_cart(&[(TEE, 1)]).await;
    shop.store
        .set_sale_price(TEE, Some(Decimal::new(800, 0)))
        .await;

    let receipt = shop
        .checkout()
        .create_checkout(BUYER, paystack_checkout())
        .await
        .unwrap();

    assert_eq!(receipt.amount, Decimal::new(1000, 0));
}

#[tokio::test]
async fn test_full_payment_flow() {
    let shop = Shop::seeded().await;
    shop.fill_cart(&[(TEE, 2), (CAP, 1)]).await;
    let checkout = shop.checkout();

    let receipt = checkout
        .create_checkout(BUYER, paystack_checkout())
        .await
        .unwrap();
    let email = wear_with_pride_core::Email::parse("ada@wearwithpride.ng").unwrap();
    let auth = checkout
        .initialize_payment(BUYER, receipt.order_id, email)
        .await
        .unwrap();
    assert_eq!(shop.gateway.initialized()[0].amount_minor, 250_000);

    shop.gateway
        .settle(&auth.reference, receipt.order_id, 250_000);
    let confirmation = checkout
        .verify_payment(BUYER, receipt.order_id, &auth.reference)
        .await
        .unwrap();

    assert!(confirmation.is_applied());
    let order = confirmation.into_order();
    assert!(order.is_paid());
    assert_eq!(order.payment_reference.as_deref(), Some(auth.reference.as_str()));
    assert_eq!(shop.store.stock(TEE).await, Some(3));
    assert_eq!(shop.store.stock(CAP).await, Some(2));
    assert!(shop.store.cart(BUYER).await.unwrap().is_none());

    let err = checkout
        .initialize_payment(
            BUYER,
            receipt.order_id,
            wear_with_pride_core::Email::parse("ada@wearwithpride.ng").unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::AlreadyPaid(_)));
}
