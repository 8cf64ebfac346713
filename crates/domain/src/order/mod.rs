//! Order aggregate and related types.

mod aggregate;
mod state;

pub use aggregate::{Order, OrderItem};
pub use state::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// An order must contain at least one item.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// Order is not in the expected status.
    #[error("invalid status transition: cannot {action} from {current_status} status")]
    InvalidStatusTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Item amounts do not reconcile with the order totals.
    #[error("order totals do not reconcile: base {base_price}, discount {discount_amount}")]
    TotalsMismatch {
        base_price: common::Money,
        discount_amount: common::Money,
    },
}
