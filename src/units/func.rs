//! # Closure-backed units.
//!
//! [`PreRunFn`] wraps a closure `F: Fn() -> Fut` into a [`PreRunner`].
//! [`ServiceFn`] wraps a closure `F: Fn(CancellationToken) -> Fut` into a [`ServiceContext`].
//!
//! Each call creates a **new** future; shared state goes into an explicit `Arc<...>` captured
//! by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use rungroup::{PreRunFn, ServiceFn, UnitError, UnitRef};
//!
//! let migrate: UnitRef = PreRunFn::arc("migrate", || async { Ok::<_, UnitError>(()) });
//! let ticker: UnitRef = ServiceFn::arc("ticker", |ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, UnitError>(())
//! });
//!
//! assert_eq!(migrate.name(), "migrate");
//! assert!(ticker.as_service_context().is_some());
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::units::unit::{PreRunner, ServiceContext, Unit};

/// Function-backed pre-run unit.
#[derive(Debug)]
pub struct PreRunFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> PreRunFn<F> {
    /// Creates a new function-backed pre-run unit.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Unit for PreRunFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn as_pre_runner(&self) -> Option<&dyn PreRunner> {
        Some(self)
    }
}

#[async_trait]
impl<F, Fut> PreRunner for PreRunFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    async fn pre_run(&self) -> Result<(), UnitError> {
        (self.f)().await
    }
}

/// Function-backed context service.
#[derive(Debug)]
pub struct ServiceFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ServiceFn<F> {
    /// Creates a new function-backed service.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the service and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Unit for ServiceFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn as_service_context(&self) -> Option<&dyn ServiceContext> {
        Some(self)
    }
}

#[async_trait]
impl<F, Fut> ServiceContext for ServiceFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    async fn serve_context(&self, ctx: CancellationToken) -> Result<(), UnitError> {
        (self.f)(ctx).await
    }
}
