//! In-memory [`Store`] for tests.
//!
//! Mirrors the guarded writes of the `PostgreSQL` store: each operation takes
//! a single write lock, so `mark_paid` and `commit_stock` are exactly-once
//! under concurrency just like their SQL counterparts. Injected failures are
//! raised before anything is mutated, like a rolled-back transaction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use wear_with_pride_core::{
    Email, OrderId, OrderStatus, PaymentStatus, ProductId, UserId, UserRole, UserStatus,
};

use super::{CartStore, CatalogStore, OrderStore, Store, UserStore};
use crate::db::RepositoryError;
use crate::models::{Cart, NewOrder, Order, OrderFilter, Product, User, UserFilter};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
    next_order_id: i32,
}

/// In-memory store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_on_mark_paid: AtomicBool,
    fail_on_commit_stock: AtomicBool,
    fail_on_delete_cart: AtomicBool,
    fail_on_ping: AtomicBool,
    cart_deletes: AtomicUsize,
}

fn injected_failure(operation: &str) -> RepositoryError {
    RepositoryError::Database(sqlx::Error::Protocol(format!(
        "injected failure in {operation}"
    )))
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `mark_paid` calls fail until reset.
    pub fn set_fail_on_mark_paid(&self, fail: bool) {
        self.fail_on_mark_paid.store(fail, Ordering::SeqCst);
    }

    /// Make the next `commit_stock` calls fail until reset.
    pub fn set_fail_on_commit_stock(&self, fail: bool) {
        self.fail_on_commit_stock.store(fail, Ordering::SeqCst);
    }

    /// Make cart deletion fail until reset, including the one inside
    /// `commit_stock`, which then rolls back as a database transaction would.
    pub fn set_fail_on_delete_cart(&self, fail: bool) {
        self.fail_on_delete_cart.store(fail, Ordering::SeqCst);
    }

    /// Make readiness pings fail until reset.
    pub fn set_fail_on_ping(&self, fail: bool) {
        self.fail_on_ping.store(fail, Ordering::SeqCst);
    }

    /// Number of carts actually deleted so far.
    #[must_use]
    pub fn cart_deletes(&self) -> usize {
        self.cart_deletes.load(Ordering::SeqCst)
    }

    /// Insert an active user with the given role.
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address.
    #[allow(clippy::unwrap_used)]
    pub async fn insert_user(&self, id: i32, email: &str, role: UserRole) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(id),
            name: format!("User {id}"),
            email: Email::parse(email).unwrap(),
            role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.users.insert(user.id, user.clone());
        user
    }

    /// Force a user's status.
    pub async fn set_user_status(&self, id: UserId, status: UserStatus) {
        if let Some(user) = self.tables.write().await.users.get_mut(&id) {
            user.status = status;
        }
    }

    /// Insert a product at `price` with `stock` units.
    pub async fn insert_product(&self, id: i32, name: &str, price: Decimal, stock: i32) -> Product {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            category: "apparel".to_string(),
            price,
            sale_price: None,
            stock,
            image_url: Some(format!("https://cdn.example.com/{id}.jpg")),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        product
    }

    /// Overwrite a product's stock level.
    pub async fn set_stock(&self, id: ProductId, stock: i32) {
        if let Some(product) = self.tables.write().await.products.get_mut(&id) {
            product.stock = stock;
        }
    }

    /// Put a product on sale, or take it off with `None`.
    pub async fn set_sale_price(&self, id: ProductId, sale_price: Option<Decimal>) {
        if let Some(product) = self.tables.write().await.products.get_mut(&id) {
            product.sale_price = sale_price;
        }
    }

    /// Current stock of a product, if it exists.
    pub async fn stock(&self, id: ProductId) -> Option<i32> {
        self.tables.read().await.products.get(&id).map(|p| p.stock)
    }

    /// Remove a product from the catalog.
    pub async fn remove_product(&self, id: ProductId) {
        self.tables.write().await.products.remove(&id);
    }

    /// Every stored order.
    pub async fn all_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.tables.read().await.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.id);
        orders
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<(Vec<User>, u64), RepositoryError> {
        let mut users: Vec<User> = self
            .tables
            .read()
            .await
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = users.len() as u64;
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let page = users
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn toggle_user_status(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.status = user.status.toggled();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.tables.read().await.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        self.tables
            .write()
            .await
            .carts
            .insert(cart.user_id(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        if self.fail_on_delete_cart.load(Ordering::SeqCst) {
            return Err(injected_failure("delete_cart"));
        }
        let removed = self.tables.write().await.carts.remove(&user_id).is_some();
        if removed {
            self.cart_deletes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.next_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(tables.next_order_id),
            user_id: order.user_id,
            items: order.items,
            shipping_address: order.shipping_address,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            order_status: OrderStatus::Processing,
            payment_reference: None,
            paid_at: None,
            stock_committed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .tables
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<(Vec<Order>, u64), RepositoryError> {
        let mut orders: Vec<Order> = self
            .tables
            .read()
            .await
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = orders.len() as u64;
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let page = orders
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn mark_paid(
        &self,
        id: OrderId,
        reference: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        if self.fail_on_mark_paid.load(Ordering::SeqCst) {
            return Err(injected_failure("mark_paid"));
        }
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(None);
        };
        if !order.payment_status.accepts_confirmation() {
            return Ok(None);
        }
        order.payment_status = PaymentStatus::Paid;
        order.payment_reference = Some(reference.to_string());
        order.paid_at = Some(paid_at);
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn commit_stock(&self, id: OrderId) -> Result<bool, RepositoryError> {
        if self.fail_on_commit_stock.load(Ordering::SeqCst) {
            return Err(injected_failure("commit_stock"));
        }
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(false);
        };
        if !order.awaits_stock_commit() {
            return Ok(false);
        }
        if self.fail_on_delete_cart.load(Ordering::SeqCst) {
            return Err(injected_failure("commit_stock cart delete"));
        }
        order.stock_committed_at = Some(Utc::now());
        let items = order.items.clone();
        let user_id = order.user_id;

        for item in items {
            if let Some(product) = tables.products.get_mut(&item.product_id) {
                product.stock -= i32::try_from(item.quantity).unwrap_or(i32::MAX);
            }
        }
        if tables.carts.remove(&user_id).is_some() {
            self.cart_deletes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(true)
    }

    async fn orders_awaiting_stock_commit(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .tables
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.awaits_stock_commit())
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(None);
        };
        if order.order_status != from {
            return Ok(None);
        }
        order.apply_status(to, at);
        Ok(Some(order.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.fail_on_ping.load(Ordering::SeqCst) {
            return Err(injected_failure("ping"));
        }
        Ok(())
    }
}
