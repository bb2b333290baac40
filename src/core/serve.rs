//! # Serve phase: concurrent fan-out, first result wins, coordinated stop.
//!
//! ```text
//! live Service + ServiceContext units (snapshot)
//!     │  none → Ok(false)
//!     ▼
//! spawn one task per unit ──► stopped? ── yes ──► send Ok(())        (ServeSkipped)
//!                                │ no
//!                                ▼
//!                   serve() / serve_context(ctx) ──► send result     (ServeFinished)
//!
//! first = rx.recv()
//!   ├─ stopped = true           (before cancel)
//!   ├─ ctx.cancel()             (every ServiceContext)
//!   ├─ graceful_stop()          (every Service, concurrently)
//!   └─ drain total-1 results, join every task
//! return first
//! ```
//!
//! ## Rules
//! - Every task sends exactly one result, panics included.
//! - A task that sees `stopped` never starts serving.
//! - The phase does not return while any task it spawned is still running.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::group::Group;
use crate::core::registry::Phase;
use crate::error::{RunError, UnitError, panic_message};
use crate::events::{Event, EventKind};
use crate::units::UnitRef;

/// Termination of one service task: unit name and what it returned.
type Exit = (String, Result<(), UnitError>);

/// Everything a service task shares with the phase.
#[derive(Clone)]
struct Launch {
    group: Group,
    stopped: Arc<AtomicBool>,
    ctx: CancellationToken,
    tx: mpsc::Sender<Exit>,
}

impl Group {
    /// Serves every live service until the first one returns.
    ///
    /// Returns `Ok(false)` when there was nothing to serve, `Ok(true)` when the first
    /// service returned without error.
    pub(super) async fn serve(&self) -> Result<bool, RunError> {
        let (services, contexts) = {
            let reg = self.inner.registry.read();
            (reg.live(Phase::Serve), reg.live(Phase::ServeContext))
        };
        let total = services.len() + contexts.len();
        if total == 0 {
            return Ok(false);
        }

        let (tx, mut rx) = mpsc::channel::<Exit>(total);
        let launch = Launch {
            group: self.clone(),
            stopped: Arc::new(AtomicBool::new(false)),
            ctx: CancellationToken::new(),
            tx,
        };

        let mut set = JoinSet::new();
        for (idx, unit) in services.iter().enumerate() {
            set.spawn(launch.clone().serve_task(Arc::clone(unit), (idx + 1, services.len())));
        }
        for (idx, unit) in contexts.iter().enumerate() {
            set.spawn(launch.clone().serve_task(Arc::clone(unit), (idx + 1, contexts.len())));
        }

        let first = rx.recv().await;

        launch.stopped.store(true, Ordering::SeqCst);
        launch.ctx.cancel();
        for (idx, unit) in services.iter().enumerate() {
            set.spawn(stop_task(
                self.clone(),
                Arc::clone(unit),
                (idx + 1, services.len()),
            ));
        }

        for _ in 1..total {
            if rx.recv().await.is_none() {
                break;
            }
        }
        while set.join_next().await.is_some() {}

        match first {
            Some((_, Ok(()))) | None => Ok(true),
            Some((unit, Err(source))) => Err(RunError::Serve { unit, source }),
        }
    }
}

impl Launch {
    async fn serve_task(self, unit: UnitRef, (nr, of): (usize, usize)) {
        let kind = if unit.as_service().is_some() {
            "serve"
        } else {
            "serve-context"
        };

        // another service may already have stopped the group before this task got scheduled
        if self.stopped.load(Ordering::SeqCst) {
            self.group.emit(
                Event::new(EventKind::ServeSkipped)
                    .with_unit(unit.name())
                    .with_item(nr, of),
            );
            let _ = self.tx.send((unit.name().to_string(), Ok(()))).await;
            return;
        }

        self.group.emit(
            Event::new(EventKind::ServeStarting)
                .with_unit(unit.name())
                .with_item(nr, of)
                .with_reason(kind),
        );

        let res = match (unit.as_service(), unit.as_service_context()) {
            (Some(svc), _) => guarded(svc.serve()).await,
            (None, Some(svc)) => guarded(svc.serve_context(self.ctx.clone())).await,
            (None, None) => Ok(()),
        };

        let mut done = Event::new(EventKind::ServeFinished)
            .with_unit(unit.name())
            .with_item(nr, of)
            .with_reason(kind);
        if let Err(err) = &res {
            done = done.with_error(format!("{err:#}"));
        }
        self.group.emit(done);

        let _ = self.tx.send((unit.name().to_string(), res)).await;
    }
}

async fn stop_task(group: Group, unit: UnitRef, (nr, of): (usize, usize)) {
    let Some(svc) = unit.as_service() else {
        return;
    };
    group.emit(
        Event::new(EventKind::GracefulStopStarting)
            .with_unit(unit.name())
            .with_item(nr, of),
    );
    let _ = AssertUnwindSafe(svc.graceful_stop()).catch_unwind().await;
    group.emit(
        Event::new(EventKind::GracefulStopFinished)
            .with_unit(unit.name())
            .with_item(nr, of),
    );
}

/// Awaits a serve future, turning a panic into the unit's error.
async fn guarded<F>(fut: F) -> Result<(), UnitError>
where
    F: std::future::Future<Output = Result<(), UnitError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic_err) => Err(anyhow::anyhow!("panicked: {}", panic_message(&*panic_err))),
    }
}
