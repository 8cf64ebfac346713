//! Order-payment saga constants.

/// The saga type identifier for order payment.
pub const SAGA_TYPE: &str = "OrderPayment";

/// Step name: Create the order with its items.
pub const STEP_CREATE_ORDER: &str = "create_order";

/// Step name: Deduct stock for each ordered item.
pub const STEP_DEDUCT_STOCK: &str = "deduct_stock";

/// Step name: Debit the wallet, consume the coupon, mark the order paid.
pub const STEP_SETTLE_PAYMENT: &str = "settle_payment";

/// Step name: Clear the user's cart (best effort).
pub const STEP_CLEAR_CART: &str = "clear_cart";
