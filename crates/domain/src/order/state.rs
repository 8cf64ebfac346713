//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its payment lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Paid ──┬──► Shipped ──► Delivered
///           │          └──► Cancelled
///           ├──► Cancelled
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order created, payment not yet settled.
    #[default]
    Pending,

    /// Payment settled; awaiting shipment.
    Paid,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (terminal state).
    Delivered,

    /// Cancelled before shipment (terminal state).
    Cancelled,

    /// Checkout failed before payment settled (terminal state).
    Failed,
}

impl OrderStatus {
    /// Returns true if payment can be settled in this status.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be shipped in this status.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the order can be delivered in this status.
    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderStatus::Shipped)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }

    /// Returns true if the order can be marked failed in this status.
    pub fn can_fail(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_pending_can_pay() {
        assert!(OrderStatus::Pending.can_pay());
        assert!(!OrderStatus::Paid.can_pay());
        assert!(!OrderStatus::Shipped.can_pay());
        assert!(!OrderStatus::Delivered.can_pay());
        assert!(!OrderStatus::Cancelled.can_pay());
        assert!(!OrderStatus::Failed.can_pay());
    }

    #[test]
    fn test_paid_can_ship() {
        assert!(!OrderStatus::Pending.can_ship());
        assert!(OrderStatus::Paid.can_ship());
        assert!(!OrderStatus::Shipped.can_ship());
        assert!(!OrderStatus::Delivered.can_ship());
        assert!(!OrderStatus::Cancelled.can_ship());
        assert!(!OrderStatus::Failed.can_ship());
    }

    #[test]
    fn test_shipped_can_deliver() {
        assert!(!OrderStatus::Pending.can_deliver());
        assert!(!OrderStatus::Paid.can_deliver());
        assert!(OrderStatus::Shipped.can_deliver());
        assert!(!OrderStatus::Delivered.can_deliver());
    }

    #[test]
    fn test_cancel_only_before_shipment() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
        assert!(!OrderStatus::Failed.can_cancel());
    }

    #[test]
    fn test_only_pending_can_fail() {
        assert!(OrderStatus::Pending.can_fail());
        assert!(!OrderStatus::Paid.can_fail());
        assert!(!OrderStatus::Shipped.can_fail());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
        assert_eq!(OrderStatus::Paid.to_string(), "Paid");
        assert_eq!(OrderStatus::Shipped.to_string(), "Shipped");
        assert_eq!(OrderStatus::Delivered.to_string(), "Delivered");
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
        assert_eq!(OrderStatus::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_serialization() {
        let status = OrderStatus::Paid;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
