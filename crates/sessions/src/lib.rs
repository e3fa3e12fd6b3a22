//! Local conversation history for Parley.
//!
//! A [`SessionStore`] keeps every saved conversation in one JSON array behind
//! a [`PersistencePort`]; the [`LifecycleController`] owns the live
//! conversation and decides when it is committed to the store.

pub mod lifecycle;
pub mod port;
pub mod store;

pub use lifecycle::{LifecycleController, PendingExchange, Resolution, FAILURE_MESSAGE};
pub use port::{FilePort, MemoryPort, PersistencePort, STORAGE_KEY};
pub use store::{Session, SessionStore, StoreError};
