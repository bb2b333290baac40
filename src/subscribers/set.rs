//! # Panic-isolated event fan-out.
//!
//! Provides [`SubscriberSet`], which hands every event to all subscribers in order.
//!
//! ```text
//! emit(event)
//!     ├──► subscriber1.on_event() ──► panic → SubscriberPanicked to the others
//!     ├──► subscriber2.on_event()
//!     └──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Per-subscriber order**: within one emitting context, events arrive in emit order.
//! - **Isolation**: a panicking subscriber does not stop delivery to the rest.
//! - **No recursion**: a panic while handling `SubscriberPanicked` is swallowed.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::panic_message;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Fan-out coordinator for multiple event subscribers.
#[derive(Clone, Default)]
pub struct SubscriberSet {
    subs: Vec<Arc<dyn Subscribe>>,
}

impl SubscriberSet {
    /// Creates a set delivering to `subs`, in order.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// `true` if events go nowhere.
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Delivers `event` to every subscriber.
    pub fn emit(&self, event: &Event) {
        for (idx, sub) in self.subs.iter().enumerate() {
            let delivered = catch_unwind(AssertUnwindSafe(|| sub.on_event(event)));
            if let Err(panic_err) = delivered {
                if matches!(event.kind, EventKind::SubscriberPanicked) {
                    continue;
                }
                let info = panic_message(&*panic_err);
                self.emit_except(idx, &Event::subscriber_panicked(sub.name(), info));
            }
        }
    }

    fn emit_except(&self, skip: usize, event: &Event) {
        for (idx, sub) in self.subs.iter().enumerate() {
            if idx != skip {
                let _ = catch_unwind(AssertUnwindSafe(|| sub.on_event(event)));
            }
        }
    }
}
