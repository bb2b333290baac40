//! # Units and their lifecycle capabilities.
//!
//! This module provides:
//! - [`Unit`] - identity plus capability probes, shared as [`UnitRef`]
//! - [`Initializer`], [`Namer`], [`Configurable`], [`PreRunner`], [`Service`], [`ServiceContext`]
//! - [`PreRunFn`], [`ServiceFn`] - closure-backed units
//! - [`Trigger`] - a service that ends the group on request

mod func;
mod trigger;
mod unit;

pub use func::{PreRunFn, ServiceFn};
pub use trigger::Trigger;
pub use unit::{Configurable, Initializer, Namer, PreRunner, Service, ServiceContext, Unit, UnitRef};
