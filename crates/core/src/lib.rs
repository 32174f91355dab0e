//! Domain logic for projects and their ordered tasks.
//!
//! Everything here is pure: no database, no HTTP. The `db` and `api` crates
//! call into these modules to validate input and decide what to write.

pub mod drag;
pub mod editor;
pub mod error;
pub mod form;
pub mod order_sync;
pub mod position;
pub mod search;
pub mod slug;
pub mod time;
pub mod types;
