//! In-memory repository implementations for testing.
//!
//! These provide the same interface and concurrency semantics as the
//! SQL-backed implementations: single-row atomicity and version-checked
//! conditional updates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CouponId, OrderId, ProductId, UserId};
use domain::{Coupon, Order, Stock, Wallet, WalletEntry};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::repository::{CouponStore, OrderStore, StockStore, WalletStore};

/// In-memory wallet store.
#[derive(Clone, Default)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<UserId, Wallet>>>,
    entries: Arc<RwLock<Vec<WalletEntry>>>,
}

impl InMemoryWalletStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of ledger entries across all wallets.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn find_by_owner(&self, owner_id: UserId) -> Result<Option<Wallet>> {
        Ok(self.wallets.read().await.get(&owner_id).cloned())
    }

    async fn create(&self, wallet: Wallet) -> Result<Wallet> {
        let mut wallets = self.wallets.write().await;
        if wallets.contains_key(&wallet.owner_id()) {
            return Err(StoreError::AlreadyExists {
                entity: "wallet",
                id: wallet.owner_id().to_string(),
            });
        }
        wallets.insert(wallet.owner_id(), wallet.clone());
        Ok(wallet)
    }

    async fn update(&self, wallet: &Wallet) -> Result<Wallet> {
        let mut wallets = self.wallets.write().await;
        let stored = wallets
            .get_mut(&wallet.owner_id())
            .ok_or_else(|| StoreError::NotFound {
                entity: "wallet",
                id: wallet.owner_id().to_string(),
            })?;

        if stored.version() != wallet.version() {
            return Err(StoreError::VersionConflict {
                entity: "wallet",
                id: wallet.owner_id().to_string(),
                expected: wallet.version(),
                actual: stored.version(),
            });
        }

        let mut next = wallet.clone();
        next.set_version(wallet.version().next());
        *stored = next.clone();
        Ok(next)
    }

    async fn record_entry(&self, entry: WalletEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn entries_for(&self, owner_id: UserId) -> Result<Vec<WalletEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

/// In-memory stock store.
#[derive(Clone, Default)]
pub struct InMemoryStockStore {
    rows: Arc<RwLock<HashMap<ProductId, Stock>>>,
}

impl InMemoryStockStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn find(&self, product_id: &ProductId) -> Result<Option<Stock>> {
        Ok(self.rows.read().await.get(product_id).cloned())
    }

    async fn create(&self, stock: Stock) -> Result<Stock> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(stock.product_id()) {
            return Err(StoreError::AlreadyExists {
                entity: "stock",
                id: stock.product_id().to_string(),
            });
        }
        rows.insert(stock.product_id().clone(), stock.clone());
        Ok(stock)
    }

    async fn update(&self, stock: &Stock) -> Result<Stock> {
        let mut rows = self.rows.write().await;
        let stored = rows
            .get_mut(stock.product_id())
            .ok_or_else(|| StoreError::NotFound {
                entity: "stock",
                id: stock.product_id().to_string(),
            })?;

        if stored.version() != stock.version() {
            return Err(StoreError::VersionConflict {
                entity: "stock",
                id: stock.product_id().to_string(),
                expected: stock.version(),
                actual: stored.version(),
            });
        }

        let mut next = stock.clone();
        next.set_version(stock.version().next());
        *stored = next.clone();
        Ok(next)
    }
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn create(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::AlreadyExists {
                entity: "order",
                id: order.id().to_string(),
            });
        }
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn update(&self, order: &Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id())
            .ok_or_else(|| StoreError::NotFound {
                entity: "order",
                id: order.id().to_string(),
            })?;

        if stored.version() != order.version() {
            return Err(StoreError::VersionConflict {
                entity: "order",
                id: order.id().to_string(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        let mut next = order.clone();
        next.set_version(order.version().next());
        *stored = next.clone();
        Ok(next)
    }

    async fn delete(&self, order_id: OrderId) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.remove(&order_id).ok_or(StoreError::NotFound {
            entity: "order",
            id: order_id.to_string(),
        })?;
        Ok(())
    }
}

/// In-memory coupon store.
#[derive(Clone, Default)]
pub struct InMemoryCouponStore {
    coupons: Arc<RwLock<HashMap<CouponId, Coupon>>>,
    fail_on_update: Arc<std::sync::atomic::AtomicBool>,
}

impl InMemoryCouponStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail update calls, simulating a backend
    /// outage mid-saga.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.fail_on_update
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn find(&self, coupon_id: CouponId) -> Result<Option<Coupon>> {
        Ok(self.coupons.read().await.get(&coupon_id).cloned())
    }

    async fn create(&self, coupon: Coupon) -> Result<Coupon> {
        let mut coupons = self.coupons.write().await;
        if coupons.contains_key(&coupon.id()) {
            return Err(StoreError::AlreadyExists {
                entity: "coupon",
                id: coupon.id().to_string(),
            });
        }
        coupons.insert(coupon.id(), coupon.clone());
        Ok(coupon)
    }

    async fn update(&self, coupon: &Coupon) -> Result<Coupon> {
        if self.fail_on_update.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Backend("injected update failure".to_string()));
        }

        let mut coupons = self.coupons.write().await;
        let stored = coupons
            .get_mut(&coupon.id())
            .ok_or_else(|| StoreError::NotFound {
                entity: "coupon",
                id: coupon.id().to_string(),
            })?;

        if stored.version() != coupon.version() {
            return Err(StoreError::VersionConflict {
                entity: "coupon",
                id: coupon.id().to_string(),
                expected: coupon.version(),
                actual: stored.version(),
            });
        }

        let mut next = coupon.clone();
        next.set_version(coupon.version().next());
        *stored = next.clone();
        Ok(next)
    }
}
