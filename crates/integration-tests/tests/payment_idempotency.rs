//! Repeated, concurrent, and interrupted payment confirmations.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use tokio::task::JoinSet;

use wear_with_pride_api::services::checkout::{CheckoutError, CheckoutService, Confirmation};
use wear_with_pride_api::store::{CartStore, OrderStore};
use wear_with_pride_core::{CurrencyCode, OrderId};
use wear_with_pride_integration_tests::{BUYER, CAP, Shop, TEE, paystack_checkout};

async fn pending_order(shop: &Shop) -> OrderId {
    shop.fill_cart(&[(TEE, 2), (CAP, 1)]).await;
    shop.checkout()
        .create_checkout(BUYER, paystack_checkout())
        .await
        .unwrap()
        .order_id
}

#[tokio::test]
async fn test_verify_twice_decrements_once() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;
    shop.gateway.settle("order_1_100", order_id, 250_000);

    let first = shop
        .checkout()
        .verify_payment(BUYER, order_id, "order_1_100")
        .await
        .unwrap();
    let second = shop
        .checkout()
        .verify_payment(BUYER, order_id, "order_1_100")
        .await
        .unwrap();

    assert!(first.is_applied());
    assert!(matches!(second, Confirmation::AlreadyPaid(_)));
    assert_eq!(shop.gateway.verify_calls(), 1);
    assert_eq!(shop.store.stock(TEE).await, Some(3));
    assert_eq!(shop.store.cart_deletes(), 1);
}

#[tokio::test]
async fn test_webhook_and_client_race() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;
    shop.gateway.settle("order_1_200", order_id, 250_000);
    let checkout = shop.checkout();

    let (client, webhook) = tokio::join!(
        checkout.verify_payment(BUYER, order_id, "order_1_200"),
        checkout.confirm_payment(order_id, "order_1_200"),
    );

    let applied = [client.unwrap(), webhook.unwrap()]
        .iter()
        .filter(|c| c.is_applied())
        .count();
    assert_eq!(applied, 1);
    assert_eq!(shop.store.stock(TEE).await, Some(3));
    assert_eq!(shop.store.stock(CAP).await, Some(2));
    assert_eq!(shop.store.cart_deletes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_deliveries_apply_once() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let store = Arc::clone(&shop.store);
        let gateway = Arc::clone(&shop.gateway);
        tasks.spawn(async move {
            CheckoutService::new(store.as_ref(), gateway.as_ref(), CurrencyCode::NGN)
                .confirm_payment(order_id, "order_1_300")
                .await
                .unwrap()
                .is_applied()
        });
    }

    let mut applied = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap() {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(shop.store.stock(TEE).await, Some(3));
    assert_eq!(shop.store.cart_deletes(), 1);
}

#[tokio::test]
async fn test_crash_between_paid_and_stock_is_recovered() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;

    shop.store.set_fail_on_commit_stock(true);
    let err = shop
        .checkout()
        .confirm_payment(order_id, "order_1_400")
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Repository(_)));
    assert!(shop.store.order(order_id).await.unwrap().unwrap().is_paid());
    assert_eq!(shop.store.stock(TEE).await, Some(5));
    shop.store.set_fail_on_commit_stock(false);

    let completed = shop.checkout().resume_stock_commits().await.unwrap();
    assert_eq!(completed, 1);
    assert_eq!(shop.store.stock(TEE).await, Some(3));
    assert!(shop.store.cart(BUYER).await.unwrap().is_none());

    // Nothing left to do on a second pass
    assert_eq!(shop.checkout().resume_stock_commits().await.unwrap(), 0);
    assert_eq!(shop.store.stock(TEE).await, Some(3));
}

#[tokio::test]
async fn test_late_retry_keeps_new_cart() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;

    shop.checkout()
        .confirm_payment(order_id, "order_1_500")
        .await
        .unwrap();

    // The buyer starts shopping again before a redelivery arrives
    shop.fill_cart(&[(CAP, 1)]).await;
    let again = shop
        .checkout()
        .confirm_payment(order_id, "order_1_500")
        .await
        .unwrap();

    assert!(!again.is_applied());
    assert!(shop.store.cart(BUYER).await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_cart_delete_is_recovered_by_resume() {
    let shop = Shop::seeded().await;
    let order_id = pending_order(&shop).await;

    shop.store.set_fail_on_delete_cart(true);
    assert!(
        shop.checkout()
            .confirm_payment(order_id, "order_1_600")
            .await
            .is_err()
    );
    shop.store.set_fail_on_delete_cart(false);

    assert_eq!(shop.checkout().resume_stock_commits().await.unwrap(), 1);
    assert_eq!(shop.store.stock(TEE).await, Some(3));
    assert!(shop.store.cart(BUYER).await.unwrap().is_none());
    assert_eq!(shop.store.cart_deletes(), 1);
}
