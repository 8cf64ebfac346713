//! Saga coordinator for placing and cancelling orders.

use std::sync::Arc;

use common::{CouponId, Money, OrderId, ProductId, UserId};
use domain::{
    CouponError, CouponStatus, Order, OrderItem, OrderStatus, PricingLine, WalletEntry,
    WalletEntryKind, allocate,
};
use lock::{LockManager, LockStore};
use serde::{Deserialize, Serialize};
use store::{CouponStore, OrderStore, RetryPolicy, StockStore, WalletStore, scope};

use crate::config::{Config, StockGuard};
use crate::context::{CommittedStep, SagaContext};
use crate::error::{Result, SagaError};
use crate::order_payment;
use crate::services::{AddressBook, CartService, ProductCatalog};

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// The product to order.
    pub product_id: ProductId,
    /// Requested quantity.
    pub quantity: u32,
    /// Promotion discount already granted on this line.
    pub promotion_discount: Money,
    /// Item-level coupon discount already granted on this line.
    pub item_coupon_discount: Money,
}

impl OrderLine {
    /// Creates a line with no per-line discounts.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            promotion_discount: Money::zero(),
            item_coupon_discount: Money::zero(),
        }
    }
}

/// Command to place and pay for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    /// The ordering user.
    pub user_id: UserId,
    /// Requested lines, in entry order.
    pub items: Vec<OrderLine>,
    /// Order-level coupon to consume, if any.
    pub coupon_id: Option<CouponId>,
}

/// Orchestrates the order-payment saga.
///
/// Each numbered step commits independently; the coordinator records every
/// committed effect in a [`SagaContext`] and, when a later step fails, runs
/// the compensations in reverse before re-raising the error.
pub struct OrderSaga {
    wallets: Arc<dyn WalletStore>,
    stocks: Arc<dyn StockStore>,
    orders: Arc<dyn OrderStore>,
    coupons: Arc<dyn CouponStore>,
    catalog: Arc<dyn ProductCatalog>,
    addresses: Arc<dyn AddressBook>,
    cart: Arc<dyn CartService>,
    locks: LockManager<Arc<dyn LockStore>>,
    retry: RetryPolicy,
    stock_guard: StockGuard,
}

impl OrderSaga {
    /// Creates a coordinator with default configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        stocks: Arc<dyn StockStore>,
        orders: Arc<dyn OrderStore>,
        coupons: Arc<dyn CouponStore>,
        catalog: Arc<dyn ProductCatalog>,
        addresses: Arc<dyn AddressBook>,
        cart: Arc<dyn CartService>,
        lock_store: Arc<dyn LockStore>,
    ) -> Self {
        Self::with_config(
            wallets,
            stocks,
            orders,
            coupons,
            catalog,
            addresses,
            cart,
            lock_store,
            Config::default(),
        )
    }

    /// Creates a coordinator with explicit configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_config(
        wallets: Arc<dyn WalletStore>,
        stocks: Arc<dyn StockStore>,
        orders: Arc<dyn OrderStore>,
        coupons: Arc<dyn CouponStore>,
        catalog: Arc<dyn ProductCatalog>,
        addresses: Arc<dyn AddressBook>,
        cart: Arc<dyn CartService>,
        lock_store: Arc<dyn LockStore>,
        config: Config,
    ) -> Self {
        Self {
            wallets,
            stocks,
            orders,
            coupons,
            catalog,
            addresses,
            cart,
            locks: LockManager::with_timings(lock_store, config.lock_ttl, config.lock_wait),
            retry: config.retry_policy(),
            stock_guard: config.stock_guard,
        }
    }

    /// Executes the place-order saga and returns the paid order.
    #[tracing::instrument(skip(self, cmd), fields(saga_type = order_payment::SAGA_TYPE, user_id = %cmd.user_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order> {
        metrics::counter!("order_saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let result = self.run_place_order(cmd).await;

        metrics::histogram!("order_saga_duration_seconds")
            .record(saga_start.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("order_saga_completed").increment(1);
                tracing::info!(order_id = %order.id(), amount = %order.payment_amount(), "order placed and paid");
            }
            Err(e) => {
                metrics::counter!("order_saga_failed").increment(1);
                tracing::warn!(error = %e, "order saga failed");
            }
        }
        result
    }

    async fn run_place_order(&self, cmd: PlaceOrder) -> Result<Order> {
        // 1. Validate and price. Nothing has committed yet, so a failure
        //    here needs no compensation.
        let coupon = self.validate_coupon(&cmd).await?;
        let used_coupon_id = coupon.as_ref().map(|c| c.id());
        let order_coupon_discount = coupon.map(|c| c.discount()).unwrap_or_else(Money::zero);

        self.addresses
            .default_for(cmd.user_id)
            .await?
            .ok_or(SagaError::NoDefaultAddress {
                user_id: cmd.user_id,
            })?;

        let pricing_lines = self.validate_products(&cmd).await?;
        let pricing = allocate(&pricing_lines, order_coupon_discount)?;
        let items: Vec<OrderItem> = pricing
            .lines
            .into_iter()
            .map(|line| OrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                base_amount: line.base_amount,
                discount_amount: line.discount_amount,
                payment_amount: line.payment_amount,
            })
            .collect();

        let mut ctx = SagaContext::new();

        // 2. Create the order with its items (transaction A).
        let order = scope(order_payment::STEP_CREATE_ORDER, async {
            let order = Order::place(OrderId::new(), cmd.user_id, used_coupon_id, items)?;
            Ok::<_, SagaError>(self.orders.create(order).await?)
        })
        .await?;
        ctx.record(CommittedStep::OrderCreated {
            order_id: order.id(),
        });

        // 3. Deduct stock per item (transaction B, compensable).
        if let Err(e) = scope(
            order_payment::STEP_DEDUCT_STOCK,
            self.deduct_stock(&mut ctx, &order),
        )
        .await
        {
            return Err(self.compensate_and_fail(ctx, e).await);
        }

        // 4. Settle payment (transaction C, compensable).
        let order = match scope(
            order_payment::STEP_SETTLE_PAYMENT,
            self.settle_payment(&mut ctx, order),
        )
        .await
        {
            Ok(order) => order,
            Err(e) => return Err(self.compensate_and_fail(ctx, e).await),
        };

        // 5. Best-effort cleanup: the order is paid, a stale cart must not
        //    fail the saga.
        if let Err(e) = self.cart.clear(cmd.user_id).await {
            tracing::warn!(user_id = %cmd.user_id, error = %e, "failed to clear cart after checkout");
        }

        Ok(order)
    }

    async fn validate_coupon(&self, cmd: &PlaceOrder) -> Result<Option<domain::Coupon>> {
        let Some(coupon_id) = cmd.coupon_id else {
            return Ok(None);
        };

        let coupon = self
            .coupons
            .find(coupon_id)
            .await?
            .ok_or(SagaError::CouponNotFound { coupon_id })?;
        coupon.ensure_owned_by(cmd.user_id)?;
        if coupon.status() == CouponStatus::Used {
            return Err(CouponError::AlreadyUsed { id: coupon_id }.into());
        }
        Ok(Some(coupon))
    }

    async fn validate_products(&self, cmd: &PlaceOrder) -> Result<Vec<PricingLine>> {
        let mut lines = Vec::with_capacity(cmd.items.len());
        for item in &cmd.items {
            let product = self.catalog.find(&item.product_id).await?.ok_or_else(|| {
                SagaError::ProductNotFound {
                    product_id: item.product_id.clone(),
                }
            })?;
            if !product.active {
                return Err(SagaError::ProductUnavailable {
                    product_id: item.product_id.clone(),
                });
            }
            lines.push(PricingLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: product.unit_price,
                promotion_discount: item.promotion_discount,
                item_coupon_discount: item.item_coupon_discount,
            });
        }
        Ok(lines)
    }

    /// Deducts stock for every item, in ascending product-ID order.
    ///
    /// The canonical ordering is what keeps concurrent sagas over
    /// overlapping product sets out of cyclic waits.
    async fn deduct_stock(&self, ctx: &mut SagaContext, order: &Order) -> Result<()> {
        let mut items: Vec<&OrderItem> = order.items().iter().collect();
        items.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        for item in items {
            self.deduct_one(item.product_id.clone(), item.quantity)
                .await?;
            ctx.record(CommittedStep::StockDeducted {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }
        Ok(())
    }

    async fn deduct_one(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        match self.stock_guard {
            StockGuard::Optimistic => self.deduct_with_retry(product_id, quantity).await,
            StockGuard::Pessimistic => {
                let key = format!("stock:{product_id}");
                self.locks
                    .run_exclusive(&key, || self.deduct_with_retry(product_id.clone(), quantity))
                    .await
            }
        }
    }

    async fn deduct_with_retry(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.retry
            .run(|| {
                let stocks = self.stocks.clone();
                let product_id = product_id.clone();
                async move {
                    let mut stock = stocks.find(&product_id).await?.ok_or_else(|| {
                        SagaError::StockNotFound {
                            product_id: product_id.clone(),
                        }
                    })?;
                    stock.decrease(quantity)?;
                    stocks.update(&stock).await?;
                    Ok(())
                }
            })
            .await
    }

    /// Debits the wallet, records the ledger entry, consumes the coupon and
    /// marks the order paid.
    async fn settle_payment(&self, ctx: &mut SagaContext, mut order: Order) -> Result<Order> {
        let amount = order.payment_amount();

        // A fully discounted order settles without touching the wallet.
        if amount.is_positive() {
            let balance_after = self.debit_wallet(order.user_id(), amount).await?;
            ctx.record(CommittedStep::WalletDebited {
                owner_id: order.user_id(),
                amount,
            });
            self.wallets
                .record_entry(WalletEntry::new(
                    order.user_id(),
                    WalletEntryKind::Use,
                    amount,
                    balance_after,
                ))
                .await?;
        }

        if let Some(coupon_id) = order.used_coupon_id() {
            self.consume_coupon(coupon_id).await?;
            ctx.record(CommittedStep::CouponConsumed { coupon_id });
        }

        order.mark_paid()?;
        Ok(self.orders.update(&order).await?)
    }

    /// Cancels an order.
    ///
    /// Cancellation is all-or-nothing: a paid order is refunded in full,
    /// its stock restored for every item, and its coupon re-issued. A
    /// pending order only transitions; it has no settled effects to undo.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound { order_id })?;
        if order.user_id() != user_id {
            return Err(SagaError::NotOrderOwner { order_id, user_id });
        }

        let was_paid = order.status() == OrderStatus::Paid;
        order.cancel()?;
        let order = self.orders.update(&order).await?;

        if was_paid {
            if order.payment_amount().is_positive() {
                let balance_after = self
                    .refund_wallet(user_id, order.payment_amount())
                    .await?;
                self.wallets
                    .record_entry(WalletEntry::new(
                        user_id,
                        WalletEntryKind::Refund,
                        order.payment_amount(),
                        balance_after,
                    ))
                    .await?;
            }
            for item in order.items() {
                self.restore_stock(item.product_id.clone(), item.quantity)
                    .await?;
            }
            if let Some(coupon_id) = order.used_coupon_id() {
                self.restore_coupon(coupon_id).await?;
            }
        }

        tracing::info!(%order_id, was_paid, "order cancelled");
        Ok(order)
    }

    /// Marks a paid order shipped.
    #[tracing::instrument(skip(self))]
    pub async fn mark_shipped(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound { order_id })?;
        order.mark_shipped()?;
        Ok(self.orders.update(&order).await?)
    }

    /// Marks a shipped order delivered.
    #[tracing::instrument(skip(self))]
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound { order_id })?;
        order.mark_delivered()?;
        Ok(self.orders.update(&order).await?)
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.find(order_id).await?)
    }

    /// Runs compensations for every committed step, in reverse commit
    /// order, then decides what the caller sees.
    ///
    /// A failed compensation never stops the chain; the remaining steps are
    /// still attempted. If everything compensated cleanly the original step
    /// error is returned; otherwise the caller gets a
    /// [`SagaError::CompensationFailed`], because un-restored state is a
    /// correctness violation that must not be masked.
    async fn compensate_and_fail(&self, ctx: SagaContext, cause: SagaError) -> SagaError {
        metrics::counter!("order_saga_compensations_total").increment(1);
        tracing::warn!(error = %cause, steps = ctx.committed().len(), "saga step failed, compensating in reverse");

        let mut compensation_failure = None;
        for step in ctx.rollback_order() {
            if let Err(e) = self.compensate_step(step).await {
                tracing::error!(
                    step = step.name(),
                    error = %e,
                    "compensation failed; manual reconciliation required"
                );
                if compensation_failure.is_none() {
                    compensation_failure = Some(SagaError::CompensationFailed {
                        step: step.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        compensation_failure.unwrap_or(cause)
    }

    async fn compensate_step(&self, step: &CommittedStep) -> Result<()> {
        match step {
            CommittedStep::CouponConsumed { coupon_id } => self.restore_coupon(*coupon_id).await,
            CommittedStep::WalletDebited { owner_id, amount } => {
                let balance_after = self.refund_wallet(*owner_id, *amount).await?;
                self.wallets
                    .record_entry(WalletEntry::new(
                        *owner_id,
                        WalletEntryKind::Refund,
                        *amount,
                        balance_after,
                    ))
                    .await
                    .map_err(SagaError::from)
            }
            CommittedStep::StockDeducted {
                product_id,
                quantity,
            } => self.restore_stock(product_id.clone(), *quantity).await,
            CommittedStep::OrderCreated { order_id } => {
                self.orders.delete(*order_id).await.map_err(SagaError::from)
            }
        }
    }

    async fn debit_wallet(&self, owner_id: UserId, amount: Money) -> Result<Money> {
        self.retry
            .run(|| {
                let wallets = self.wallets.clone();
                async move {
                    let mut wallet = wallets
                        .find_by_owner(owner_id)
                        .await?
                        .ok_or(SagaError::WalletNotFound { user_id: owner_id })?;
                    wallet.use_balance(amount)?;
                    let updated = wallets.update(&wallet).await?;
                    Ok(updated.balance())
                }
            })
            .await
    }

    async fn refund_wallet(&self, owner_id: UserId, amount: Money) -> Result<Money> {
        self.retry
            .run(|| {
                let wallets = self.wallets.clone();
                async move {
                    let mut wallet = wallets
                        .find_by_owner(owner_id)
                        .await?
                        .ok_or(SagaError::WalletNotFound { user_id: owner_id })?;
                    wallet.refund(amount)?;
                    let updated = wallets.update(&wallet).await?;
                    Ok(updated.balance())
                }
            })
            .await
    }

    async fn restore_stock(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.retry
            .run(|| {
                let stocks = self.stocks.clone();
                let product_id = product_id.clone();
                async move {
                    let mut stock = stocks.find(&product_id).await?.ok_or_else(|| {
                        SagaError::StockNotFound {
                            product_id: product_id.clone(),
                        }
                    })?;
                    stock.increase(quantity)?;
                    stocks.update(&stock).await?;
                    Ok(())
                }
            })
            .await
    }

    async fn consume_coupon(&self, coupon_id: CouponId) -> Result<()> {
        self.retry
            .run(|| {
                let coupons = self.coupons.clone();
                async move {
                    let mut coupon = coupons
                        .find(coupon_id)
                        .await?
                        .ok_or(SagaError::CouponNotFound { coupon_id })?;
                    coupon.use_coupon()?;
                    coupons.update(&coupon).await?;
                    Ok(())
                }
            })
            .await
    }

    async fn restore_coupon(&self, coupon_id: CouponId) -> Result<()> {
        self.retry
            .run(|| {
                let coupons = self.coupons.clone();
                async move {
                    let mut coupon = coupons
                        .find(coupon_id)
                        .await?
                        .ok_or(SagaError::CouponNotFound { coupon_id })?;
                    coupon.restore()?;
                    coupons.update(&coupon).await?;
                    Ok(())
                }
            })
            .await
    }
}
