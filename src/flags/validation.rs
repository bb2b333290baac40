//! Helpers for reporting flag validation failures from [`Configurable::validate`](crate::Configurable::validate).

use std::fmt::Display;

use crate::error::UnitError;

/// Common reasons a flag value is rejected.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagError {
    /// A required option was not provided.
    #[error("required")]
    Required,
    /// A path option does not point at something usable.
    #[error("invalid path")]
    InvalidPath,
    /// The value passed to the flag is not acceptable.
    #[error("invalid value")]
    InvalidValue,
}

/// Wraps `reason` as a validation error for `--flag`.
///
/// The reason stays in the error chain, so callers can still downcast to it.
///
/// # Example
/// ```
/// use rungroup::flags::{FlagError, validation_error};
///
/// let err = validation_error("listen", FlagError::Required);
/// assert_eq!(format!("{err:#}"), "--listen error: required");
/// assert_eq!(err.downcast_ref::<FlagError>(), Some(&FlagError::Required));
/// ```
pub fn validation_error<E>(flag: &str, reason: E) -> UnitError
where
    E: std::error::Error + Send + Sync + 'static,
{
    UnitError::new(reason).context(format!("--{flag} error"))
}

/// Like [`validation_error`] for reasons that are plain messages.
pub fn validation_message(flag: &str, reason: impl Display) -> UnitError {
    anyhow::anyhow!("--{flag} error: {reason}")
}
