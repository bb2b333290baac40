//! # Events emitted while a group runs.
//!
//! [`EventKind`] classifies events in four groups:
//! - **Config events**: flag registration and validation
//! - **Run events**: pre-run, serve and graceful stop of individual units
//! - **Outcome events**: how the run ended
//! - **Subscriber events**: problems inside subscribers themselves
//!
//! ## Ordering guarantees
//! Each event carries a process-wide sequence number (`seq`) that increases monotonically.
//! Events from concurrently running services may reach subscribers interleaved; `seq`
//! restores the order in which they were created.
//!
//! ## Example
//! ```rust
//! use rungroup::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::PreRunFinished)
//!     .with_unit("migrations")
//!     .with_item(2, 3)
//!     .with_error("table exists");
//!
//! assert_eq!(ev.unit.as_deref(), Some("migrations"));
//! assert_eq!(ev.item_label().as_deref(), Some("(2/3)"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use tracing::Level;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of group events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Config events ===
    /// A configurable unit's flag set is being merged into the namespace.
    ///
    /// Sets:
    /// - `unit`: unit name (`--deregistered--` for a cleared slot)
    /// - `item`: position among configurable units
    FlagSetRegistered,

    /// A flag was dropped because its name was already taken.
    ///
    /// Sets:
    /// - `unit`: unit name
    /// - `flag`: flag name
    FlagIgnored,

    /// Validation of one unit is starting.
    ///
    /// Sets:
    /// - `unit`: unit name
    /// - `item`: position among configurable units
    ValidateStarting,

    /// Validation of one unit finished.
    ///
    /// Sets:
    /// - `unit`, `item`
    /// - `error`: validation error, if any
    ValidateFinished,

    /// Config phase finished; the group is about to run.
    ///
    /// Sets:
    /// - `reason`: `"<name> <version> started"`
    Started,

    // === Run events ===
    /// A deregistered slot was passed over.
    ///
    /// Sets:
    /// - `reason`: phase (`validate`, `pre-run`)
    /// - `item`: slot position
    DeregisteredSkipped,

    /// Pre-run of one unit is starting.
    ///
    /// Sets:
    /// - `unit`, `item`
    PreRunStarting,

    /// Pre-run of one unit finished.
    ///
    /// Sets:
    /// - `unit`, `item`
    /// - `error`: pre-run error, if any
    PreRunFinished,

    /// A service task is about to call `serve` / `serve_context`.
    ///
    /// Sets:
    /// - `unit`, `item`
    /// - `reason`: `serve` or `serve-context`
    ServeStarting,

    /// A service task did not start serving because shutdown had already begun.
    ///
    /// Sets:
    /// - `unit`, `item`
    ServeSkipped,

    /// A service returned.
    ///
    /// Sets:
    /// - `unit`, `item`
    /// - `reason`: `serve` or `serve-context`
    /// - `error`: termination error, if any
    ServeFinished,

    /// `graceful_stop` is being called on a service.
    ///
    /// Sets:
    /// - `unit`, `item`
    GracefulStopStarting,

    /// `graceful_stop` returned.
    ///
    /// Sets:
    /// - `unit`, `item`
    GracefulStopFinished,

    // === Outcome events ===
    /// A unit asked for shutdown; the run ends cleanly.
    ///
    /// Sets:
    /// - `error`: the shutdown request as returned by the unit
    ShutdownRequested,

    /// The run ended in error.
    ///
    /// Sets:
    /// - `error`: the error returned to the caller
    UnexpectedExit,

    /// The run ended without services and without error.
    Done,

    // === Subscriber events ===
    /// A subscriber panicked while handling an event.
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,
}

impl EventKind {
    /// Default level at which this kind is logged.
    pub fn level(self) -> Level {
        match self {
            EventKind::Started | EventKind::ShutdownRequested | EventKind::Done => Level::INFO,
            EventKind::FlagIgnored => Level::WARN,
            EventKind::UnexpectedExit | EventKind::SubscriberPanicked => Level::ERROR,
            _ => Level::DEBUG,
        }
    }

    /// Short stable label used as the log message.
    pub fn as_label(self) -> &'static str {
        match self {
            EventKind::FlagSetRegistered => "flagset",
            EventKind::FlagIgnored => "ignoring duplicate flag",
            EventKind::ValidateStarting => "validate",
            EventKind::ValidateFinished => "validate-exit",
            EventKind::Started => "started",
            EventKind::DeregisteredSkipped => "skip deregistered",
            EventKind::PreRunStarting => "pre-run",
            EventKind::PreRunFinished => "pre-run-exit",
            EventKind::ServeStarting => "serve",
            EventKind::ServeSkipped => "serve-skip",
            EventKind::ServeFinished => "serve-exit",
            EventKind::GracefulStopStarting => "graceful-stop",
            EventKind::GracefulStopFinished => "graceful-stop-exit",
            EventKind::ShutdownRequested => "received shutdown request",
            EventKind::UnexpectedExit => "unexpected exit",
            EventKind::Done => "done",
            EventKind::SubscriberPanicked => "subscriber panicked",
        }
    }
}

/// Group event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the unit, if applicable.
    pub unit: Option<Arc<str>>,
    /// Position of the unit in its phase list and the list length.
    pub item: Option<(usize, usize)>,
    /// Flag name (flag events only).
    pub flag: Option<Arc<str>>,
    /// Error text, rendered with its full chain.
    pub error: Option<Arc<str>>,
    /// Free-form detail.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            unit: None,
            item: None,
            flag: None,
            error: None,
            reason: None,
        }
    }

    /// Attaches a unit name.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a 1-based position and the list length.
    #[inline]
    pub fn with_item(mut self, nr: usize, total: usize) -> Self {
        self.item = Some((nr, total));
        self
    }

    /// Attaches a flag name.
    #[inline]
    pub fn with_flag(mut self, flag: impl Into<Arc<str>>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }

    /// Renders `item` as `(nr/total)`.
    pub fn item_label(&self) -> Option<String> {
        self.item.map(|(nr, total)| format!("({nr}/{total})"))
    }
}
