//! Shop application library
//!
//! Book and publisher CRUD plus a daily fortune endpoint, packaged as
//! modules for the shop kernel registry.

pub mod app;
pub mod modules;
pub mod store;
pub mod utils;

pub use app::{build_registry, run};
pub use store::ShopStore;
