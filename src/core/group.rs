//! # Group: the run group facade.
//!
//! A [`Group`] owns the unit registry, the resolved name, the subscriber set and whatever the
//! config phase produced (positional arguments, flag sections for help output).
//!
//! ## High-level architecture
//! ```text
//! register(units) ──► Registry (slot list per phase)
//!
//! run() / run_with(args):
//!   ├─ run_config (once, latch)        Initialize → Namer → flags → parse → bail? → Validate
//!   ├─ initialize (late registrations)
//!   ├─ pre_run                         serial, fail-fast
//!   └─ serve                           fan-out tasks ─► mpsc ─► first result
//!                                       stopped=true, cancel(), graceful_stop(), drain
//!
//! outcome:
//!   Err(RequestedShutdown ...)  → Ok(())         (ShutdownRequested)
//!   Ok, no services             → Ok(())         (Done)
//!   Ok, services ran            → Err(TerminatedWithoutError)
//!   Err(other)                  → Err(other)     (UnexpectedExit)
//! ```
//!
//! `Group` is a cheap handle (`Clone` shares the same group), so units can hold one and
//! deregister other units from inside their own callbacks. The registry lets go of every
//! unit when [`run_with`](Group::run_with) returns (or its future is dropped), which breaks
//! the unit → group → unit cycle such a handle creates.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use rungroup::{Group, GroupConfig, PreRunFn, ServiceFn, Trigger, UnitError, UnitRef};
//! use std::ffi::OsString;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), rungroup::RunError> {
//!     let group = Group::builder(GroupConfig::named("demo"))
//!         .with_subscribers(Vec::new())
//!         .build();
//!
//!     let trigger = Arc::new(Trigger::new("stopper"));
//!     let t = trigger.clone();
//!     let migrate: UnitRef = PreRunFn::arc("migrate", move || {
//!         let t = t.clone();
//!         async move {
//!             t.close();
//!             Ok::<_, UnitError>(())
//!         }
//!     });
//!     let ticker: UnitRef = ServiceFn::arc("ticker", |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, UnitError>(())
//!     });
//!
//!     group.register(&[migrate, ticker, trigger as UnitRef]);
//!     group.run_with(["demo"]).await
//! }
//! ```

use std::ffi::OsString;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::GroupConfig;
use crate::core::builder::GroupBuilder;
use crate::core::registry::{Phase, Registry};
use crate::error::RunError;
use crate::events::{Event, EventKind};
use crate::flags::FlagSet;
use crate::subscribers::SubscriberSet;
use crate::units::UnitRef;

pub(super) struct Shared {
    pub(super) cfg: GroupConfig,
    pub(super) registry: RwLock<Registry>,
    pub(super) name: RwLock<String>,
    pub(super) help_text: RwLock<String>,
    pub(super) args: RwLock<Vec<String>>,
    pub(super) sections: RwLock<Vec<FlagSet>>,
    pub(super) subs: SubscriberSet,
}

/// Orchestrates units through the config, pre-run and serve phases.
#[derive(Clone)]
pub struct Group {
    pub(super) inner: Arc<Shared>,
}

impl Group {
    /// Creates a group that logs through [`LogWriter`](crate::LogWriter).
    pub fn new(cfg: GroupConfig) -> Self {
        GroupBuilder::new(cfg).build()
    }

    /// Returns a builder for a group with custom subscribers.
    pub fn builder(cfg: GroupConfig) -> GroupBuilder {
        GroupBuilder::new(cfg)
    }

    pub(super) fn from_parts(cfg: GroupConfig, subs: SubscriberSet) -> Self {
        let name = cfg.name.clone().unwrap_or_default();
        let help_text = cfg.help_text.clone();
        Self {
            inner: Arc::new(Shared {
                cfg,
                registry: RwLock::new(Registry::default()),
                name: RwLock::new(name),
                help_text: RwLock::new(help_text),
                args: RwLock::new(Vec::new()),
                sections: RwLock::new(Vec::new()),
                subs,
            }),
        }
    }

    /// Registers units for every phase whose capability they expose.
    ///
    /// Returns, per unit, whether it matched at least one phase. Namer and Configurable
    /// registrations made after the config phase ran are kept but never invoked.
    ///
    /// # Panics
    /// If a unit exposes both [`Service`](crate::Service) and
    /// [`ServiceContext`](crate::ServiceContext).
    pub fn register(&self, units: &[UnitRef]) -> Vec<bool> {
        let mut reg = self.inner.registry.write();
        units.iter().map(|u| reg.register(u)).collect()
    }

    /// Clears every slot held by the given units.
    ///
    /// Safe to call from inside any phase callback. Deregistering a service that is already
    /// serving has no effect on it; stop it yourself.
    pub fn deregister(&self, units: &[UnitRef]) -> Vec<bool> {
        let mut reg = self.inner.registry.write();
        units.iter().map(|u| reg.deregister(u)).collect()
    }

    /// Resolved group name. Final once the config phase ran.
    pub fn name(&self) -> String {
        self.inner.name.read().clone()
    }

    /// Positional arguments left over after flag parsing.
    pub fn args(&self) -> Vec<String> {
        self.inner.args.read().clone()
    }

    /// `true` once the config phase has started.
    pub fn is_configured(&self) -> bool {
        self.inner.registry.read().is_configured()
    }

    /// The phase membership table printed by `--show-rungroup-units`.
    pub fn list_units(&self) -> String {
        let name = self.name();
        self.inner.registry.read().list_units(&name)
    }

    /// Runs every phase with the process arguments.
    ///
    /// See [`run_with`](Self::run_with).
    pub async fn run(&self) -> Result<(), RunError> {
        self.run_with(Vec::<OsString>::new()).await
    }

    /// Runs every phase with `args` (first element is the binary name; empty means the
    /// process arguments) and blocks until the group stops.
    ///
    /// The config phase is skipped if [`run_config`](Self::run_config) already ran. Help,
    /// version and unit listing requests end the run with `Ok(())`. A service asking for
    /// shutdown through [`RequestedShutdown`](crate::RequestedShutdown) also yields `Ok(())`;
    /// a service returning `Ok(())` on its own yields [`RunError::TerminatedWithoutError`].
    ///
    /// However the run ends, the group drops its references to every registered unit.
    pub async fn run_with<I, T>(&self, args: I) -> Result<(), RunError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let _release = Release(self);

        if !self.is_configured() {
            match self.run_config_with(args) {
                Ok(()) => {}
                Err(e) if e.is_bail_early() => return Ok(()),
                Err(e) => return Err(e),
            }
        }

        let outcome = self.run_phases().await;
        self.finish(outcome)
    }

    async fn run_phases(&self) -> Result<bool, RunError> {
        // units registered after the config phase still get their initializer
        self.initialize_pending();
        self.pre_run().await?;
        self.serve().await
    }

    /// Maps the phase outcome (`Ok(true)` = services ran) onto the run result.
    fn finish(&self, outcome: Result<bool, RunError>) -> Result<(), RunError> {
        match outcome {
            Ok(false) => {
                self.emit(Event::new(EventKind::Done));
                Ok(())
            }
            Ok(true) => {
                let err = RunError::TerminatedWithoutError;
                self.emit(Event::new(EventKind::UnexpectedExit).with_error(err.to_string()));
                Err(err)
            }
            Err(err) if err.is_requested_shutdown() => {
                self.emit(Event::new(EventKind::ShutdownRequested).with_error(err.to_string()));
                Ok(())
            }
            Err(err) => {
                self.emit(Event::new(EventKind::UnexpectedExit).with_error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Calls every pending initializer once, clearing its slot first.
    pub(super) fn initialize_pending(&self) {
        let total = self.inner.registry.read().len(Phase::Initialize);
        for idx in 0..total {
            let unit = self.inner.registry.write().take(Phase::Initialize, idx);
            if let Some(init) = unit.as_ref().and_then(|u| u.as_initializer()) {
                init.initialize();
            }
        }
    }

    /// Current occupant of a slot. The registry lock is released before returning.
    pub(super) fn slot(&self, phase: Phase, idx: usize) -> Option<UnitRef> {
        self.inner.registry.read().get(phase, idx)
    }

    pub(super) fn emit(&self, event: Event) {
        if !self.inner.subs.is_empty() {
            self.inner.subs.emit(&event);
        }
    }
}

/// Empties the registry when a run ends, on every return path and on cancellation.
struct Release<'a>(&'a Group);

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.0.inner.registry.write().release();
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &*self.inner.name.read())
            .field("configured", &self.is_configured())
            .finish()
    }
}
