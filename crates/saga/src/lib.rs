//! Order-payment saga for the checkout core.
//!
//! Placing an order is a sequence of independently committed steps with
//! compensating actions on failure:
//!
//! 1. Validate products, address, coupon; price the order
//! 2. Create the order with its items (Pending)
//! 3. Deduct stock per item, in ascending product-ID order
//! 4. Settle payment: debit wallet, record the ledger entry, consume the
//!    coupon, mark the order Paid
//! 5. Clear the cart (best effort)
//!
//! Each committed effect is recorded in a [`SagaContext`]; when a later step
//! fails, the recorded steps are compensated in reverse order and the
//! original error is re-raised.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod order_payment;
pub mod services;

pub use config::{Config, StockGuard};
pub use context::{CommittedStep, SagaContext};
pub use coordinator::{OrderLine, OrderSaga, PlaceOrder};
pub use error::SagaError;
pub use services::{
    AddressBook, CartItem, CartService, InMemoryAddressBook, InMemoryCartService,
    InMemoryProductCatalog, Product, ProductCatalog, ShippingAddress,
};
