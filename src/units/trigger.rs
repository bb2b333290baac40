//! # Programmatic shutdown trigger.
//!
//! [`Trigger`] is a [`Service`] that does nothing but wait. Calling [`Trigger::close`] from
//! anywhere makes it return [`RequestedShutdown`], which stops the whole group cleanly.
//!
//! ```text
//! close()          ──► serve() returns Err(RequestedShutdown) ──► group stops, run() = Ok(())
//! graceful_stop()  ──► serve() returns Ok(())                  (another unit stopped first)
//! ```
//!
//! Both signals are latched, so calling `close` before the group started serving still works.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{RequestedShutdown, UnitError};
use crate::units::unit::{Service, Unit};

/// Service that ends the group on request.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use rungroup::{Group, GroupConfig, Trigger, UnitRef};
///
/// # async fn demo() -> Result<(), rungroup::RunError> {
/// let group = Group::new(GroupConfig::default());
/// let trigger = Arc::new(Trigger::new("stopper"));
/// group.register(&[trigger.clone() as UnitRef]);
///
/// let t = trigger.clone();
/// tokio::spawn(async move { t.close() });
/// group.run().await
/// # }
/// ```
#[derive(Debug)]
pub struct Trigger {
    name: String,
    closed: CancellationToken,
    stopped: CancellationToken,
}

impl Trigger {
    /// Creates a trigger with the given unit name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            closed: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }

    /// Requests shutdown of the group this trigger is registered with.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl Unit for Trigger {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }
}

#[async_trait]
impl Service for Trigger {
    async fn serve(&self) -> Result<(), UnitError> {
        tokio::select! {
            _ = self.closed.cancelled() => Err(RequestedShutdown.into()),
            _ = self.stopped.cancelled() => Ok(()),
        }
    }

    async fn graceful_stop(&self) {
        self.stopped.cancel();
    }
}
