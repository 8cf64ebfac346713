//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CouponId, Money, OrderId, ProductId, UserId, Version};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};

/// One line of an order, priced by the discount allocator.
///
/// Created atomically with its order; the sum of item payment amounts always
/// equals the order payment amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The ordered product.
    pub product_id: ProductId,
    /// Ordered quantity.
    pub quantity: u32,
    /// Unit price at order time.
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub base_amount: Money,
    /// Total discount applied to this line.
    pub discount_amount: Money,
    /// `base_amount − discount_amount`.
    pub payment_amount: Money,
}

/// Order aggregate root.
///
/// Created in Pending by the place-order saga; the status field walks the
/// state machine in [`OrderStatus`]. Totals are derived from the items at
/// creation time and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    base_price: Money,
    discount_amount: Money,
    payment_amount: Money,
    used_coupon_id: Option<CouponId>,
    items: Vec<OrderItem>,
    created_at: DateTime<Utc>,
    version: Version,
}

impl Order {
    /// Creates a pending order from priced items.
    ///
    /// Totals are the sums over the items; an order with a discount larger
    /// than its base price is rejected.
    pub fn place(
        id: OrderId,
        user_id: UserId,
        used_coupon_id: Option<CouponId>,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let base_price = Money::sum(items.iter().map(|i| i.base_amount));
        let discount_amount = Money::sum(items.iter().map(|i| i.discount_amount));
        let payment_amount = Money::sum(items.iter().map(|i| i.payment_amount));

        if discount_amount > base_price || base_price.subtract(discount_amount) != payment_amount {
            return Err(OrderError::TotalsMismatch {
                base_price,
                discount_amount,
            });
        }

        Ok(Self {
            id,
            user_id,
            status: OrderStatus::Pending,
            base_price,
            discount_amount,
            payment_amount,
            used_coupon_id,
            items,
            created_at: Utc::now(),
            version: Version::initial(),
        })
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the user who placed the order.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the sum of item base amounts.
    pub fn base_price(&self) -> Money {
        self.base_price
    }

    /// Returns the total discount across items.
    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    /// Returns the amount actually charged to the wallet.
    pub fn payment_amount(&self) -> Money {
        self.payment_amount
    }

    /// Returns the coupon consumed by this order, if any.
    pub fn used_coupon_id(&self) -> Option<CouponId> {
        self.used_coupon_id
    }

    /// Returns the order items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the version this state was read at.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the version. Called by the store after a successful write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Status transitions
impl Order {
    /// Marks the order paid (Pending → Paid).
    pub fn mark_paid(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Paid, OrderStatus::can_pay, "pay")
    }

    /// Marks the order shipped (Paid → Shipped).
    pub fn mark_shipped(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Shipped, OrderStatus::can_ship, "ship")
    }

    /// Marks the order delivered (Shipped → Delivered).
    pub fn mark_delivered(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Delivered, OrderStatus::can_deliver, "deliver")
    }

    /// Cancels the order (Pending/Paid → Cancelled).
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled, OrderStatus::can_cancel, "cancel")
    }

    /// Marks the order failed (Pending → Failed).
    pub fn mark_failed(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Failed, OrderStatus::can_fail, "fail")
    }

    fn transition(
        &mut self,
        next: OrderStatus,
        allowed: fn(&OrderStatus) -> bool,
        action: &'static str,
    ) -> Result<(), OrderError> {
        if !allowed(&self.status) {
            return Err(OrderError::InvalidStatusTransition {
                current_status: self.status,
                action,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, quantity: u32, unit_cents: i64, discount_cents: i64) -> OrderItem {
        let unit_price = Money::from_cents(unit_cents);
        let base_amount = unit_price.multiply(quantity);
        let discount_amount = Money::from_cents(discount_cents);
        OrderItem {
            product_id: ProductId::new(sku),
            quantity,
            unit_price,
            base_amount,
            discount_amount,
            payment_amount: base_amount.subtract(discount_amount),
        }
    }

    fn order() -> Order {
        Order::place(
            OrderId::new(),
            UserId::new(),
            None,
            vec![item("SKU-001", 2, 1000, 100), item("SKU-002", 1, 2500, 0)],
        )
        .unwrap()
    }

    #[test]
    fn test_place_derives_totals() {
        let order = order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.base_price(), Money::from_cents(4500));
        assert_eq!(order.discount_amount(), Money::from_cents(100));
        assert_eq!(order.payment_amount(), Money::from_cents(4400));
    }

    #[test]
    fn test_item_payments_sum_to_order_payment() {
        let order = order();
        let item_sum = Money::sum(order.items().iter().map(|i| i.payment_amount));
        assert_eq!(item_sum, order.payment_amount());
    }

    #[test]
    fn test_place_rejects_empty_order() {
        let result = Order::place(OrderId::new(), UserId::new(), None, vec![]);
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut order = order();
        order.mark_paid().unwrap();
        order.mark_shipped().unwrap();
        order.mark_delivered().unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(order.status().is_terminal());
    }

    #[test]
    fn test_cancel_from_pending_and_paid() {
        let mut pending = order();
        pending.cancel().unwrap();
        assert_eq!(pending.status(), OrderStatus::Cancelled);

        let mut paid = order();
        paid.mark_paid().unwrap();
        paid.cancel().unwrap();
        assert_eq!(paid.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_after_shipment_rejected() {
        let mut order = order();
        order.mark_paid().unwrap();
        order.mark_shipped().unwrap();
        assert!(matches!(
            order.cancel(),
            Err(OrderError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_pay_twice_rejected() {
        let mut order = order();
        order.mark_paid().unwrap();
        assert!(matches!(
            order.mark_paid(),
            Err(OrderError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_ship_requires_paid() {
        let mut order = order();
        assert!(matches!(
            order.mark_shipped(),
            Err(OrderError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_fail_only_from_pending() {
        let mut order = order();
        order.mark_failed().unwrap();
        assert_eq!(order.status(), OrderStatus::Failed);

        let mut paid = self::order();
        paid.mark_paid().unwrap();
        assert!(matches!(
            paid.mark_failed(),
            Err(OrderError::InvalidStatusTransition { .. })
        ));
    }
}
