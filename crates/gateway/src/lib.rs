//! Parley binary internals: the `/api/chat` completion endpoint and the
//! terminal client commands.

pub mod api;
pub mod cli;
pub mod state;
