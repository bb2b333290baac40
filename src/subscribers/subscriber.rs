//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the logger interface injected into a [`Group`](crate::Group).
//!
//! ## Rules
//! - Events are delivered synchronously, in the context that produced them. During the
//!   serve phase that is one of the service tasks, so several events may be delivered
//!   concurrently.
//! - Panics are caught; the other subscribers receive `EventKind::SubscriberPanicked`.
//! - Subscribers must not block: they run on the group's own control path.

use crate::events::Event;

/// Event subscriber for group observability.
///
/// ### Implementation requirements
/// - Return quickly; hand heavy work off to a channel or task.
/// - Handle errors internally; do not panic.
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
