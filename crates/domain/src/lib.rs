//! Shared types for Parley: conversation turns, response modes,
//! configuration, the error type, and structured trace events.

pub mod config;
pub mod error;
pub mod gateway;
pub mod mode;
pub mod trace;
pub mod turn;

pub use gateway::CompletionGateway;
pub use mode::ResponseMode;
pub use turn::{Role, Turn};
