//! Committed-step tracking for compensation.

use common::{CouponId, Money, OrderId, ProductId, UserId};

/// A committed effect of the order saga that must be undone if a later step
/// fails. Marking the order Paid is intentionally absent: it is the final
/// fallible effect, so nothing after it can trigger compensation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommittedStep {
    /// The order row (with its items) was created.
    OrderCreated { order_id: OrderId },

    /// One product's stock was decreased.
    StockDeducted {
        product_id: ProductId,
        quantity: u32,
    },

    /// The wallet was debited for the payment amount.
    WalletDebited { owner_id: UserId, amount: Money },

    /// The order coupon was consumed.
    CouponConsumed { coupon_id: CouponId },
}

impl CommittedStep {
    /// Returns the step name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            CommittedStep::OrderCreated { .. } => "create_order",
            CommittedStep::StockDeducted { .. } => "deduct_stock",
            CommittedStep::WalletDebited { .. } => "debit_wallet",
            CommittedStep::CouponConsumed { .. } => "consume_coupon",
        }
    }
}

/// Ephemeral record of which saga steps have committed.
///
/// Lives only for one saga execution and is never persisted. The
/// compensation runner walks the recorded steps once, in reverse commit
/// order, which keeps the undo sequence auditable and testable on its own.
#[derive(Debug, Default)]
pub struct SagaContext {
    committed: Vec<CommittedStep>,
}

impl SagaContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed step.
    pub fn record(&mut self, step: CommittedStep) {
        tracing::debug!(step = step.name(), "saga step committed");
        self.committed.push(step);
    }

    /// Returns the committed steps in commit order.
    pub fn committed(&self) -> &[CommittedStep] {
        &self.committed
    }

    /// Returns the committed steps in the order they must be compensated:
    /// the reverse of commit order.
    pub fn rollback_order(&self) -> impl Iterator<Item = &CommittedStep> {
        self.committed.iter().rev()
    }
}
