//! # OS signal handling unit.
//!
//! [`Handler`] turns termination signals into a [`RequestedShutdown`] and `SIGHUP` into an
//! application supplied refresh callback.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT`, `SIGQUIT`, `SIGTERM` → `serve_context` returns `RequestedShutdown` (clean stop)
//! - `SIGHUP` → refresh callback; a callback error ends the group in error
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! Listeners are installed in `pre_run`, so signals arriving between pre-run and serve
//! are not lost.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use rungroup::{Group, GroupConfig, UnitRef, signal::Handler};
//!
//! # async fn demo() -> Result<(), rungroup::RunError> {
//! let group = Group::new(GroupConfig::named("api"));
//! let signals = Handler::new().with_refresh(|| {
//!     // reload certificates
//!     Ok(())
//! });
//! group.register(&[Arc::new(signals) as UnitRef]);
//! group.run().await
//! # }
//! ```

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{RequestedShutdown, UnitError};
use crate::units::{PreRunner, ServiceContext, Unit};

type Refresh = Box<dyn Fn() -> Result<(), UnitError> + Send + Sync>;

/// Signal handling unit (`PreRunner` + `ServiceContext`).
#[derive(Default)]
pub struct Handler {
    refresh: Option<Refresh>,
    listeners: Mutex<Option<Listeners>>,
}

impl Handler {
    /// Creates a handler without refresh callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the callback invoked on `SIGHUP`.
    pub fn with_refresh<F>(mut self, refresh: F) -> Self
    where
        F: Fn() -> Result<(), UnitError> + Send + Sync + 'static,
    {
        self.refresh = Some(Box::new(refresh));
        self
    }
}

impl Unit for Handler {
    fn name(&self) -> &str {
        "signal"
    }

    fn as_pre_runner(&self) -> Option<&dyn PreRunner> {
        Some(self)
    }

    fn as_service_context(&self) -> Option<&dyn ServiceContext> {
        Some(self)
    }
}

#[async_trait]
impl PreRunner for Handler {
    async fn pre_run(&self) -> Result<(), UnitError> {
        let listeners = Listeners::install().context("installing signal listeners")?;
        *self.listeners.lock() = Some(listeners);
        Ok(())
    }
}

#[async_trait]
impl ServiceContext for Handler {
    async fn serve_context(&self, ctx: CancellationToken) -> Result<(), UnitError> {
        let installed = self.listeners.lock().take();
        let mut listeners = match installed {
            Some(listeners) => listeners,
            None => Listeners::install().context("installing signal listeners")?,
        };

        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                sig = listeners.recv() => self.on_signal(sig)?,
            }
        }
    }
}

impl Handler {
    /// Reacts to one received signal. An error ends `serve_context`.
    fn on_signal(&self, sig: std::io::Result<Received>) -> Result<(), UnitError> {
        match sig.context("waiting for signals")? {
            Received::Refresh => {
                if let Some(refresh) = &self.refresh {
                    refresh().context("error on signal SIGHUP")?;
                }
                Ok(())
            }
            Received::Shutdown(name) => Err(UnitError::new(RequestedShutdown).context(name)),
        }
    }
}

enum Received {
    Refresh,
    Shutdown(&'static str),
}

#[cfg(unix)]
struct Listeners {
    hup: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
    term: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Listeners {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            hup: signal(SignalKind::hangup())?,
            int: signal(SignalKind::interrupt())?,
            quit: signal(SignalKind::quit())?,
            term: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> std::io::Result<Received> {
        Ok(tokio::select! {
            _ = self.hup.recv() => Received::Refresh,
            _ = self.int.recv() => Received::Shutdown("SIGINT"),
            _ = self.quit.recv() => Received::Shutdown("SIGQUIT"),
            _ = self.term.recv() => Received::Shutdown("SIGTERM"),
        })
    }
}

#[cfg(not(unix))]
struct Listeners;

#[cfg(not(unix))]
impl Listeners {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> std::io::Result<Received> {
        tokio::signal::ctrl_c().await?;
        Ok(Received::Shutdown("Ctrl-C"))
    }
}
