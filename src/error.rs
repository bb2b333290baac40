//! Error types used by the run group and its units.
//!
//! This module defines:
//!
//! - [`RunError`]: errors (and the bail-early sentinel) returned by the group itself.
//! - [`ValidationErrors`]: the ordered aggregate of every failed [`Configurable::validate`](crate::Configurable::validate).
//! - [`RequestedShutdown`]: the sentinel a service returns to stop the group without failing it.
//! - [`UnitError`]: what unit callbacks return.
//!
//! [`RunError`] provides `as_label` for logs plus [`RunError::is`] which walks wrapped
//! unit errors the same way the group decides whether a shutdown was requested.

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Error returned by unit callbacks.
///
/// Any error type converts into it with `?`; wrap with [`anyhow::Context`] to add detail
/// without hiding the original (the group inspects the whole chain).
pub type UnitError = anyhow::Error;

/// Sentinel error a [`Service`](crate::Service) or [`ServiceContext`](crate::ServiceContext)
/// returns to request an orderly shutdown of the whole group.
///
/// The group reports such a run as clean, also when the sentinel is wrapped with context.
///
/// # Example
/// ```
/// use anyhow::Context;
/// use rungroup::{RequestedShutdown, UnitError};
///
/// let err: UnitError = UnitError::new(RequestedShutdown).context("SIGTERM");
/// assert!(err.downcast_ref::<RequestedShutdown>().is_some());
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("shutdown requested")]
pub struct RequestedShutdown;

/// # Errors produced by a run group.
///
/// [`RunError::BailEarly`] is not a failure: it tells the caller that the run already did
/// its job (help, version or unit listing was printed) and the process should exit with success.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// Help, version or unit listing was served; nothing left to do.
    #[error("exit request from flag handler")]
    BailEarly,

    /// The command line did not parse against the combined flag namespace.
    #[error("{0}")]
    Flags(#[from] clap::Error),

    /// One or more configurable units rejected their configuration.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// A pre-run step failed; later pre-run steps were skipped.
    #[error("pre-run {unit}: {source:#}")]
    PreRun {
        /// Name of the failing unit.
        unit: String,
        /// Error returned by the unit.
        source: UnitError,
    },

    /// The first service to terminate did so with an error.
    #[error("serve {unit}: {source:#}")]
    Serve {
        /// Name of the unit that terminated first.
        unit: String,
        /// Error returned by the unit.
        source: UnitError,
    },

    /// Services were running and the first one returned without an error.
    #[error("run terminated without explicit error condition")]
    TerminatedWithoutError,
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use rungroup::RunError;
    ///
    /// assert_eq!(RunError::BailEarly.as_label(), "run_bail_early");
    /// assert_eq!(RunError::TerminatedWithoutError.as_label(), "run_terminated_without_error");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::BailEarly => "run_bail_early",
            RunError::Flags(_) => "run_flags",
            RunError::Validation(_) => "run_validation",
            RunError::PreRun { .. } => "run_pre_run",
            RunError::Serve { .. } => "run_serve",
            RunError::TerminatedWithoutError => "run_terminated_without_error",
        }
    }

    /// `true` for the bail-early sentinel.
    pub fn is_bail_early(&self) -> bool {
        matches!(self, RunError::BailEarly)
    }

    /// `true` when a unit error anywhere in this error wraps [`RequestedShutdown`].
    pub fn is_requested_shutdown(&self) -> bool {
        self.is::<RequestedShutdown>()
    }

    /// Reports whether any unit error carried by this error has an `E` in its chain.
    ///
    /// # Example
    /// ```
    /// use rungroup::{RequestedShutdown, RunError, UnitError};
    ///
    /// let err = RunError::Serve { unit: "signal".into(), source: UnitError::new(RequestedShutdown) };
    /// assert!(err.is::<RequestedShutdown>());
    /// assert!(!RunError::BailEarly.is::<RequestedShutdown>());
    /// ```
    pub fn is<E>(&self) -> bool
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let wraps = |err: &UnitError| err.chain().any(|cause| cause.is::<E>());
        match self {
            RunError::PreRun { source, .. } | RunError::Serve { source, .. } => wraps(source),
            RunError::Validation(errs) => errs.iter().any(wraps),
            _ => false,
        }
    }

    /// Returns the unit error of single-origin failures.
    pub fn unit_error(&self) -> Option<&UnitError> {
        match self {
            RunError::PreRun { source, .. } | RunError::Serve { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Every error returned by the validation step, in unit registration order.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<UnitError>,
}

impl ValidationErrors {
    pub(crate) fn push(&mut self, err: UnitError) {
        self.errors.push(err);
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `true` if no validation failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates the collected errors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => writeln!(f, "1 error occurred:")?,
            n => writeln!(f, "{n} errors occurred:")?,
        }
        for err in &self.errors {
            writeln!(f, "\t* {err:#}")?;
        }
        writeln!(f)
    }
}

impl std::error::Error for ValidationErrors {}

/// Extracts the message of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
