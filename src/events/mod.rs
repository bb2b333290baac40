//! Lifecycle events.
//!
//! The group describes everything it does as an [`Event`]: flag registration, validation,
//! pre-run, serve, graceful stop and the final outcome. Events are handed to the
//! [`SubscriberSet`](crate::SubscriberSet), which is the group's only logging path.
//!
//! ## Contents
//! - [`EventKind`] classification and default log level
//! - [`Event`] payload with sequence number, timestamp and per-kind metadata

mod event;

pub use event::{Event, EventKind};
