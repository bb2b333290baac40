use crate::core::group::Group;
use crate::core::registry::Phase;
use crate::error::RunError;
use crate::events::{Event, EventKind};

impl Group {
    /// Runs every pre-runner serially, in registration order. Stops at the first failure.
    pub(super) async fn pre_run(&self) -> Result<(), RunError> {
        let total = self.inner.registry.read().len(Phase::PreRun);
        for idx in 0..total {
            let Some(unit) = self.slot(Phase::PreRun, idx) else {
                self.emit(
                    Event::new(EventKind::DeregisteredSkipped)
                        .with_item(idx + 1, total)
                        .with_reason("pre-run"),
                );
                continue;
            };
            let Some(runner) = unit.as_pre_runner() else {
                continue;
            };

            self.emit(
                Event::new(EventKind::PreRunStarting)
                    .with_unit(unit.name())
                    .with_item(idx + 1, total),
            );
            let res = runner.pre_run().await;

            let mut done = Event::new(EventKind::PreRunFinished)
                .with_unit(unit.name())
                .with_item(idx + 1, total);
            if let Err(err) = &res {
                done = done.with_error(format!("{err:#}"));
            }
            self.emit(done);

            res.map_err(|source| RunError::PreRun {
                unit: unit.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}
