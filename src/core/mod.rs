//! Run group core: registry, phases and the [`Group`] facade.
//!
//! Internal modules:
//! - [`registry`]: per-phase slot lists, deregistration by clearing;
//! - [`config_phase`]: naming, flags, bail-early requests, validation;
//! - [`pre_run`]: serial fail-fast preparation steps;
//! - [`serve`]: concurrent services, first result wins, coordinated stop;
//! - [`group`]: the public facade sequencing the phases.

mod builder;
mod config_phase;
mod group;
mod pre_run;
mod registry;
mod serve;

#[cfg(test)]
mod tests;

pub use builder::GroupBuilder;
pub use group::Group;
