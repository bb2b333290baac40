//! Flag namespace used by the config phase.
//!
//! - [`FlagSet`]: ordered, named set of [`Flag`]s with typed [`Value`] handles
//! - [`FlagValue`]: Rust types that can back a flag (string, bool, ints, float, duration)
//! - [`FlagError`], [`validation_error`]: conventions for rejecting flag values
//!
//! Parsing is done by `clap`; usage output follows the familiar pflag layout.

mod set;
mod usage;
mod validation;
mod value;

pub use set::{Flag, FlagSet, FlagSetError};
pub use validation::{FlagError, validation_error, validation_message};
pub use value::{FlagValue, Value};
