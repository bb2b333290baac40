//! # rungroup
//!
//! **rungroup** coordinates the lifecycle of a long-running program.
//!
//! Independently written components ("units") are registered with a [`Group`]. The group
//! detects which lifecycle capabilities each unit exposes, walks them through a fixed
//! sequence of bootstrap phases, runs every service concurrently and, as soon as one of
//! them stops, stops all the others and waits for them before returning.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Unit      │   │    Unit      │   │    Unit      │
//!     │ (config+svc) │   │  (pre-run)   │   │  (signals)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Group (run group facade)                                         │
//! │  - Registry (slot list per phase, deregistration clears slots)    │
//! │  - configured latch                                               │
//! │  - SubscriberSet (synchronous, panic-isolated event fan-out)      │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   Config phase       PreRun phase       Serve phase
//!   Initialize         serial,            one task per service
//!   Namer              fail-fast          first result wins
//!   flags + parse                         stopped latch → cancel → graceful stop
//!   Validate (all)                        drain every result
//! ```
//!
//! ### Outcome
//! ```text
//! --help / --version / --show-rungroup-units   ─► Ok(())  (printed, nothing else runs)
//! parse / validation / pre-run error           ─► Err(RunError)
//! first service returned RequestedShutdown     ─► Ok(())
//! first service returned another error         ─► Err(RunError::Serve)
//! first service returned Ok(())                ─► Err(RunError::TerminatedWithoutError)
//! no services at all                           ─► Ok(())
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Units**         | Capabilities a component can expose.                          | [`Unit`], [`Service`], [`ServiceContext`]  |
//! | **Helpers**       | Closure-backed units and a programmatic shutdown trigger.     | [`PreRunFn`], [`ServiceFn`], [`Trigger`]   |
//! | **Flags**         | Per-unit flag sets merged into one command line.              | [`FlagSet`], [`Value`]                     |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics).                | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed run errors and the shutdown sentinel.                   | [`RunError`], [`RequestedShutdown`]        |
//! | **Configuration** | Name, help text and version of the group.                     | [`GroupConfig`]                            |
//!
//! ## Optional features
//! - `signal` _(default)_: [`signal::Handler`], a unit turning OS signals into a shutdown request.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use rungroup::{Group, GroupConfig, PreRunFn, ServiceFn, Trigger, UnitError, UnitRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), rungroup::RunError> {
//!     let group = Group::new(GroupConfig::named("hello"));
//!
//!     let trigger = Arc::new(Trigger::new("stop-after-greeting"));
//!     let t = trigger.clone();
//!     let hello: UnitRef = ServiceFn::arc("hello", move |ctx: CancellationToken| {
//!         let t = t.clone();
//!         async move {
//!             println!("Hello from a service!");
//!             t.close();
//!             ctx.cancelled().await;
//!             Ok::<_, UnitError>(())
//!         }
//!     });
//!     let warmup: UnitRef = PreRunFn::arc("warmup", || async { Ok::<_, UnitError>(()) });
//!
//!     group.register(&[warmup, hello, trigger as UnitRef]);
//!     group.run_with(["hello"]).await
//! }
//! ```
pub mod config;
mod core;
mod error;
mod events;
pub mod flags;
#[cfg(feature = "signal")]
pub mod signal;
mod subscribers;
mod units;
mod version;

// ---- Public re-exports ----

pub use config::GroupConfig;
pub use core::{Group, GroupBuilder};
pub use error::{RequestedShutdown, RunError, UnitError, ValidationErrors};
pub use events::{Event, EventKind};
pub use flags::{FlagSet, Value};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use units::{
    Configurable, Initializer, Namer, PreRunFn, PreRunner, Service, ServiceContext, ServiceFn,
    Trigger, Unit, UnitRef,
};
