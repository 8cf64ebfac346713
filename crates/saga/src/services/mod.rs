//! Collaborator service contracts consumed by the saga.
//!
//! Product catalog, address book and cart storage are owned by other parts
//! of the platform; the saga only depends on these call contracts. The
//! in-memory implementations back the test suite.

pub mod address;
pub mod cart;
pub mod catalog;

pub use address::{AddressBook, InMemoryAddressBook, ShippingAddress};
pub use cart::{CartItem, CartService, InMemoryCartService};
pub use catalog::{InMemoryProductCatalog, Product, ProductCatalog};
