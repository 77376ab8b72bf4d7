//! Optimistic, server-synchronized entity stores for a personal-finance
//! REST backend.

pub mod app;
pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod notify;
pub mod query;
pub mod record;
pub mod resolver;
pub mod store;
pub mod views;

pub use error::StoreError;
pub use record::Record;
pub use store::{EntityStore, LoadOutcome, Phase, Snapshot};
