//! # Unit registry - per-phase slot lists.
//!
//! The registry classifies units by the capabilities they expose and keeps one ordered list
//! of slots per [`Phase`]. A unit exposing several capabilities occupies a slot in each
//! matching list.
//!
//! ## Architecture
//! ```text
//! register(unit) ──► as_initializer? ──► initialize    [Some(u1), Some(u3)]
//!                ├─► as_namer?       ──► name          [Some(u2)]
//!                ├─► as_configurable?──► config        [Some(u2), None, Some(u4)]
//!                ├─► as_pre_runner?  ──► pre-run       [Some(u1)]
//!                ├─► as_service?     ──► serve         [Some(u5)]
//!                └─► as_service_ctx? ──► serve-context [Some(u6)]
//! ```
//!
//! ## Rules
//! - Lists only grow while a run is in progress. Deregistration clears a slot (`None`) so
//!   indices held by a running phase loop stay valid.
//! - Once a run is over every list is emptied, releasing the units.
//! - A cleared slot is never invoked.
//! - A unit exposing both `Service` and `ServiceContext` is a programming error and panics.
//! - Identity is pointer identity of the shared handle, never the name.

use std::sync::Arc;

use crate::units::UnitRef;

/// Lifecycle phase a slot list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Initialize,
    Name,
    Config,
    PreRun,
    Serve,
    ServeContext,
}

impl Phase {
    pub(crate) const ALL: [Phase; 6] = [
        Phase::Initialize,
        Phase::Name,
        Phase::Config,
        Phase::PreRun,
        Phase::Serve,
        Phase::ServeContext,
    ];

    pub(crate) fn as_label(self) -> &'static str {
        match self {
            Phase::Initialize => "initialize",
            Phase::Name => "name",
            Phase::Config => "config",
            Phase::PreRun => "pre-run",
            Phase::Serve => "serve",
            Phase::ServeContext => "serve-context",
        }
    }

    fn matches(self, unit: &UnitRef) -> bool {
        match self {
            Phase::Initialize => unit.as_initializer().is_some(),
            Phase::Name => unit.as_namer().is_some(),
            Phase::Config => unit.as_configurable().is_some(),
            Phase::PreRun => unit.as_pre_runner().is_some(),
            Phase::Serve => unit.as_service().is_some(),
            Phase::ServeContext => unit.as_service_context().is_some(),
        }
    }
}

/// Slot lists for every phase plus the `configured` latch.
#[derive(Default)]
pub(crate) struct Registry {
    lists: [Vec<Option<UnitRef>>; 6],
    configured: bool,
}

impl Registry {
    /// Appends `unit` to every phase list it qualifies for.
    ///
    /// Returns `false` when the unit matched no phase (it is then inert).
    ///
    /// # Panics
    /// If the unit exposes both `Service` and `ServiceContext`.
    pub(crate) fn register(&mut self, unit: &UnitRef) -> bool {
        if unit.as_service().is_some() && unit.as_service_context().is_some() {
            panic!(
                "ambiguous service {} encountered: a Unit MUST NOT implement both Service and ServiceContext",
                unit.name()
            );
        }

        let mut matched = false;
        for phase in Phase::ALL {
            if phase.matches(unit) {
                self.lists[phase as usize].push(Some(Arc::clone(unit)));
                matched = true;
            }
        }
        matched
    }

    /// Clears every slot holding `unit`. Returns `true` if at least one slot was cleared.
    pub(crate) fn deregister(&mut self, unit: &UnitRef) -> bool {
        let mut cleared = false;
        for list in &mut self.lists {
            for slot in list.iter_mut() {
                if slot.as_ref().is_some_and(|u| same_unit(u, unit)) {
                    *slot = None;
                    cleared = true;
                }
            }
        }
        cleared
    }

    /// Number of slots (live or cleared) in a phase list.
    pub(crate) fn len(&self, phase: Phase) -> usize {
        self.lists[phase as usize].len()
    }

    /// Occupant of a slot; `None` for cleared or out-of-range slots.
    pub(crate) fn get(&self, phase: Phase, idx: usize) -> Option<UnitRef> {
        self.lists[phase as usize].get(idx).cloned().flatten()
    }

    /// Removes and returns the occupant of a slot, leaving it cleared.
    pub(crate) fn take(&mut self, phase: Phase, idx: usize) -> Option<UnitRef> {
        self.lists[phase as usize].get_mut(idx).and_then(Option::take)
    }

    /// Drops every slot of every phase. The `configured` latch stays set.
    pub(crate) fn release(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }

    /// Snapshot of the live units of a phase, in registration order.
    pub(crate) fn live(&self, phase: Phase) -> Vec<UnitRef> {
        self.lists[phase as usize].iter().flatten().cloned().collect()
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.configured
    }

    /// Closes the latch. Returns `false` if it was already closed.
    pub(crate) fn mark_configured(&mut self) -> bool {
        !std::mem::replace(&mut self.configured, true)
    }

    /// Renders the phase membership table, e.g.
    ///
    /// ```text
    /// Group: api [svc]
    /// - config: http
    /// - serve: http
    /// ```
    pub(crate) fn list_units(&self, group: &str) -> String {
        let mut kind = "cli";
        let mut table = String::new();
        for phase in Phase::ALL {
            let list = &self.lists[phase as usize];
            if list.is_empty() {
                continue;
            }
            let names: Vec<&str> = list.iter().flatten().map(|u| u.name()).collect();
            if !names.is_empty() && matches!(phase, Phase::Serve | Phase::ServeContext) {
                kind = "svc";
            }
            table.push_str(&format!("\n- {}: {}", phase.as_label(), names.join(" ")));
        }
        format!("Group: {group} [{kind}]{table}")
    }
}

fn same_unit(a: &UnitRef, b: &UnitRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
