//! # Unit identity and lifecycle capabilities.
//!
//! Every component registered with a [`Group`](crate::Group) implements [`Unit`]. On top of
//! that a unit opts into any of the lifecycle capabilities by implementing the capability
//! trait **and** returning `Some(self)` from the matching probe on [`Unit`]:
//!
//! | Capability         | Probe                      | Phase                                  |
//! |--------------------|----------------------------|----------------------------------------|
//! | [`Initializer`]    | `as_initializer`           | before anything else, at most once     |
//! | [`Namer`]          | `as_namer`                 | config, receives the final group name  |
//! | [`Configurable`]   | `as_configurable`          | config, flags + validation             |
//! | [`PreRunner`]      | `as_pre_runner`            | serially after config                  |
//! | [`Service`]        | `as_service`               | concurrently, stopped via graceful stop|
//! | [`ServiceContext`] | `as_service_context`       | concurrently, stopped via cancellation |
//!
//! [`Service`] and [`ServiceContext`] are mutually exclusive; registering a unit that
//! exposes both panics.
//!
//! All methods take `&self`: units are shared (`Arc<dyn Unit>`) between the group and the
//! tasks it spawns, so mutable state lives behind atomics or locks inside the unit.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::flags::FlagSet;

/// Shared handle to a registered unit. Identity is the allocation it points to.
pub type UnitRef = Arc<dyn Unit>;

/// # Registrable component.
///
/// # Example
/// ```
/// use rungroup::{Initializer, Unit};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Cache { warm: AtomicBool }
///
/// impl Unit for Cache {
///     fn name(&self) -> &str { "cache" }
///     fn as_initializer(&self) -> Option<&dyn Initializer> { Some(self) }
/// }
///
/// impl Initializer for Cache {
///     fn initialize(&self) { self.warm.store(true, Ordering::SeqCst); }
/// }
/// ```
pub trait Unit: Send + Sync + 'static {
    /// Short human-readable identifier; need not be unique.
    fn name(&self) -> &str;

    /// Returns `Some` if the unit wants the initialize step.
    fn as_initializer(&self) -> Option<&dyn Initializer> {
        None
    }

    /// Returns `Some` if the unit wants to learn the group name.
    fn as_namer(&self) -> Option<&dyn Namer> {
        None
    }

    /// Returns `Some` if the unit contributes flags and validation.
    fn as_configurable(&self) -> Option<&dyn Configurable> {
        None
    }

    /// Returns `Some` if the unit has a pre-run step.
    fn as_pre_runner(&self) -> Option<&dyn PreRunner> {
        None
    }

    /// Returns `Some` if the unit is a blocking service stopped with [`Service::graceful_stop`].
    fn as_service(&self) -> Option<&dyn Service> {
        None
    }

    /// Returns `Some` if the unit is a blocking service stopped by cancellation.
    fn as_service_context(&self) -> Option<&dyn ServiceContext> {
        None
    }
}

/// Initialization that must happen before any other phase.
///
/// Called at most once per registration.
pub trait Initializer: Unit {
    fn initialize(&self);
}

/// Receives the final group name (after `--name` was applied), before flag sets are collected.
///
/// Useful for deriving flag defaults from the name, e.g. a socket path.
pub trait Namer: Unit {
    fn group_name(&self, name: &str);
}

/// A unit that manages its configuration through flags.
pub trait Configurable: Unit {
    /// Flags to merge into the group namespace. `None` contributes nothing.
    fn flag_set(&self) -> Option<FlagSet>;

    /// Checks the parsed values. Every unit is validated; all errors are reported together.
    fn validate(&self) -> Result<(), UnitError>;
}

/// A preparation step run serially, in registration order, after config.
///
/// The first failing pre-run aborts the group.
#[async_trait]
pub trait PreRunner: Unit {
    async fn pre_run(&self) -> Result<(), UnitError>;
}

/// A blocking service.
///
/// `serve` runs until the service fails, asks for shutdown (return
/// [`RequestedShutdown`](crate::RequestedShutdown)), or is told to stop through
/// `graceful_stop`. A service must not return `Ok(())` on its own initiative: the group
/// treats that as an error.
#[async_trait]
pub trait Service: Unit {
    /// Runs the service. Must return once `graceful_stop` was called.
    async fn serve(&self) -> Result<(), UnitError>;

    /// Asks a running `serve` to return. May be called even if `serve` never started.
    async fn graceful_stop(&self);
}

/// A blocking service that stops when the group cancels the provided token.
#[async_trait]
pub trait ServiceContext: Unit {
    async fn serve_context(&self, ctx: CancellationToken) -> Result<(), UnitError>;
}
