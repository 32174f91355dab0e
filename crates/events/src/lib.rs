//! Live-update event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ProjectEvent`]: a committed change to a project or its task order,
//!   addressed to one or more subscription channels.
//!
//! Delivery is best effort: publishing never blocks and slow subscribers
//! skip messages instead of holding up writers.

pub mod bus;

pub use bus::{project_channel, EventBus, ProjectEvent, ProjectEventKind, INDEX_CHANNEL};
