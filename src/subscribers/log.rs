//! # LogWriter: events to `tracing`
//!
//! The default subscriber of every group. Each event becomes one `tracing` event at the
//! kind's level, with the event's metadata as structured fields. Nothing is printed unless
//! the application installs a `tracing` subscriber.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! DEBUG rungroup: flagset seq=3 unit="http" item="(1/2)"
//! DEBUG rungroup: validate seq=5 unit="http" item="(1/2)"
//!  INFO rungroup: started seq=9 reason="api v1.2.0 started"
//! DEBUG rungroup: serve seq=12 unit="http" item="(1/1)" reason="serve"
//!  INFO rungroup: received shutdown request seq=20 error="SIGTERM: shutdown requested"
//! ```

use tracing::Level;

use crate::events::Event;
use crate::subscribers::Subscribe;

macro_rules! trace_event {
    ($level:expr, $ev:expr, $item:expr) => {
        tracing::event!(
            target: "rungroup",
            $level,
            seq = $ev.seq,
            unit = $ev.unit.as_deref(),
            item = $item,
            flag = $ev.flag.as_deref(),
            error = $ev.error.as_deref(),
            reason = $ev.reason.as_deref(),
            "{}",
            $ev.kind.as_label()
        )
    };
}

/// Subscriber that forwards events to `tracing`.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let item = e.item_label();
        let item = item.as_deref();
        let level = e.kind.level();

        if level == Level::ERROR {
            trace_event!(Level::ERROR, e, item);
        } else if level == Level::WARN {
            trace_event!(Level::WARN, e, item);
        } else if level == Level::INFO {
            trace_event!(Level::INFO, e, item);
        } else {
            trace_event!(Level::DEBUG, e, item);
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
