//! Persistence contracts for the checkout core.
//!
//! Repositories expose single-row find/create/update/delete; `update` is
//! conditioned on the entity's read-version and fails with
//! [`StoreError::VersionConflict`] when another writer got there first.
//! Callers compose rows into larger logical transactions with
//! [`scope::scope`] and retry conflicted mutations through an explicit
//! [`retry::RetryPolicy`].

pub mod error;
pub mod memory;
pub mod repository;
pub mod retry;
pub mod scope;

pub use error::{Result, StoreError};
pub use memory::{InMemoryCouponStore, InMemoryOrderStore, InMemoryStockStore, InMemoryWalletStore};
pub use repository::{CouponStore, OrderStore, StockStore, WalletStore};
pub use retry::{ConflictKind, RetryPolicy};
pub use scope::scope;
