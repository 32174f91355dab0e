//! Delivery of committed project changes to live-update subscribers.

mod router;

pub use router::NotificationRouter;
