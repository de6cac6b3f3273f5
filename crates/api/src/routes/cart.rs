//! Cart route handlers.
//!
//! Every mutation returns the whole cart, with current product details
//! alongside each line's locked-in price.

use std::collections::HashMap;

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;
use uuid::Uuid;

use wear_with_pride_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Cart, CartItem, Product};
use crate::routes::{ApiJson, ApiPath};
use crate::services::cart::{AddToCart, CartService};
use crate::state::AppState;

/// Product details shown next to a cart line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            sale_price: product.sale_price,
            stock: product.stock,
            image_url: product.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    /// `None` when the product has since been removed from the catalog.
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_price: Decimal,
}

impl CartView {
    fn new(cart: &Cart, products: &[Product]) -> Self {
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    item: item.clone(),
                    product: by_id.get(&item.product_id).map(|p| ProductSummary::from(*p)),
                })
                .collect(),
            total_price: cart.total_price(),
        }
    }
}

async fn view(service: &CartService<'_>, cart: &Cart) -> Result<Json<CartView>> {
    let products = service.products(cart).await?;
    Ok(Json(CartView::new(cart, &products)))
}

/// The caller's cart, empty if they have none yet.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let service = CartService::new(state.store());
    let cart = service.get(user.id).await?;
    view(&service, &cart).await
}

/// Add a product to the cart.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<AddToCart>,
) -> Result<Json<CartView>> {
    let service = CartService::new(state.store());
    let cart = service.add(user.id, request).await?;
    view(&service, &cart).await
}

#[derive(Debug, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// Set the quantity of one line.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(item_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<QuantityUpdate>,
) -> Result<Json<CartView>> {
    let service = CartService::new(state.store());
    let cart = service
        .update_quantity(user.id, item_id, body.quantity)
        .await?;
    view(&service, &cart).await
}

/// Remove one line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(item_id): ApiPath<Uuid>,
) -> Result<Json<CartView>> {
    let service = CartService::new(state.store());
    let cart = service.remove(user.id, item_id).await?;
    view(&service, &cart).await
}

/// Delete the caller's cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    CartService::new(state.store()).clear(user.id).await?;
    Ok(Json(json!({ "message": "Cart cleared" })))
}
