//! # Typed flag values.
//!
//! [`Value`] is the handle a unit keeps for each flag it registers. It starts out holding the
//! default and is overwritten only when the flag appears on the command line.
//!
//! [`FlagValue`] maps a Rust type onto a clap value parser, a pflag-style type name and a
//! default rendering for usage output.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use clap::builder::ValueParser;
use parking_lot::RwLock;

/// Shared, typed handle to a flag's current value.
///
/// Cloning is cheap; all clones observe the same value.
///
/// # Example
/// ```
/// use rungroup::FlagSet;
///
/// let mut fs = FlagSet::new("listener");
/// let port = fs.int("port", Some('p'), 8080, "listen port");
/// assert_eq!(port.get(), 8080);
/// ```
pub struct Value<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Value<T> {
    pub(crate) fn new(init: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(init)),
        }
    }

    /// Overwrites the current value.
    pub fn set(&self, value: T) {
        *self.inner.write() = value;
    }

    /// Runs `f` with a borrow of the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read())
    }
}

impl<T: Clone> Value<T> {
    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.inner.read().clone()
    }
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&*self.inner.read()).finish()
    }
}

/// A type that can back a flag.
pub trait FlagValue: Clone + Send + Sync + 'static {
    /// Type name shown in usage output (`""` hides it, as for bools).
    const TYPE_NAME: &'static str;

    /// Parser clap uses to turn the raw argument into `Self`.
    fn value_parser() -> ValueParser;

    /// Default value as shown in usage output; `None` suppresses the `(default ...)` suffix.
    fn render_default(&self) -> Option<String>;
}

impl FlagValue for String {
    const TYPE_NAME: &'static str = "string";

    fn value_parser() -> ValueParser {
        clap::value_parser!(String).into()
    }

    fn render_default(&self) -> Option<String> {
        (!self.is_empty()).then(|| format!("{self:?}"))
    }
}

impl FlagValue for bool {
    const TYPE_NAME: &'static str = "";

    fn value_parser() -> ValueParser {
        clap::value_parser!(bool).into()
    }

    fn render_default(&self) -> Option<String> {
        self.then(|| "true".to_string())
    }
}

impl FlagValue for i64 {
    const TYPE_NAME: &'static str = "int";

    fn value_parser() -> ValueParser {
        clap::value_parser!(i64).into()
    }

    fn render_default(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl FlagValue for u64 {
    const TYPE_NAME: &'static str = "uint";

    fn value_parser() -> ValueParser {
        clap::value_parser!(u64).into()
    }

    fn render_default(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl FlagValue for f64 {
    const TYPE_NAME: &'static str = "float";

    fn value_parser() -> ValueParser {
        clap::value_parser!(f64).into()
    }

    fn render_default(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl FlagValue for Duration {
    const TYPE_NAME: &'static str = "duration";

    fn value_parser() -> ValueParser {
        ValueParser::new(humantime::parse_duration)
    }

    fn render_default(&self) -> Option<String> {
        Some(humantime::format_duration(*self).to_string())
    }
}
