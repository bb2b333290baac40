//! # Event subscribers for the run group.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! default [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Group / service tasks ── emit(Event) ──► SubscriberSet
//!                                                 │
//!                                  ┌──────────────┼──────────────┐
//!                                  ▼              ▼              ▼
//!                              LogWriter      Metrics         Custom ...
//!                              (tracing)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use rungroup::{Event, EventKind, Subscribe};
//!
//! struct Audit;
//!
//! impl Subscribe for Audit {
//!     fn on_event(&self, event: &Event) {
//!         if matches!(event.kind, EventKind::UnexpectedExit) {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
