//! # Example: service
//!
//! Wires a small "server" into a run group together with the signal handler.
//!
//! Shows how to:
//! - Contribute flags from a unit ([`Configurable`]) and validate them.
//! - Derive a flag default from the group name ([`Namer`]).
//! - Implement a blocking [`Service`] stopped through `graceful_stop`.
//! - Let SIGINT/SIGTERM end the run cleanly through [`signal::Handler`].
//!
//! ## Flow
//! ```text
//! Group::run()
//!     ├─► Namer::group_name("service")      → default socket path
//!     ├─► Configurable::flag_set / validate  → --listen, --tick
//!     ├─► signal::Handler::pre_run           → install listeners
//!     └─► serve:  Ticker::serve  ║  Handler::serve_context
//!                 SIGTERM ──► RequestedShutdown ──► Ticker::graceful_stop ──► Ok(())
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example service -- --listen /tmp/api.sock --tick 500ms
//! cargo run --example service -- --help
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rungroup::flags::{FlagError, validation_error};
use rungroup::{
    Configurable, FlagSet, Group, GroupConfig, Namer, Service, Unit, UnitError, UnitRef, Value,
    signal,
};

/// Pretends to serve requests on a socket; logs a line per tick.
struct Ticker {
    default_socket: Mutex<String>,
    listen: Mutex<Option<Value<String>>>,
    tick: Mutex<Option<Value<Duration>>>,
    stop: CancellationToken,
}

impl Ticker {
    fn new() -> Self {
        Self {
            default_socket: Mutex::new(String::new()),
            listen: Mutex::new(None),
            tick: Mutex::new(None),
            stop: CancellationToken::new(),
        }
    }

    fn listen(&self) -> String {
        self.listen.lock().as_ref().map(Value::get).unwrap_or_default()
    }

    fn tick(&self) -> Duration {
        self.tick
            .lock()
            .as_ref()
            .map_or(Duration::from_secs(1), Value::get)
    }
}

impl Unit for Ticker {
    fn name(&self) -> &str {
        "ticker"
    }

    fn as_namer(&self) -> Option<&dyn Namer> {
        Some(self)
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }
}

impl Namer for Ticker {
    fn group_name(&self, name: &str) {
        *self.default_socket.lock() = format!("/tmp/{name}.sock");
    }
}

impl Configurable for Ticker {
    fn flag_set(&self) -> Option<FlagSet> {
        let mut fs = FlagSet::new("Ticker options");
        let default_socket = self.default_socket.lock().clone();
        *self.listen.lock() = Some(fs.string("listen", Some('l'), &default_socket, "socket to listen on"));
        *self.tick.lock() = Some(fs.duration("tick", None, Duration::from_secs(1), "interval between ticks"));
        Some(fs)
    }

    fn validate(&self) -> Result<(), UnitError> {
        if self.listen().is_empty() {
            return Err(validation_error("listen", FlagError::Required));
        }
        if self.tick().is_zero() {
            return Err(validation_error("tick", FlagError::InvalidValue));
        }
        Ok(())
    }
}

#[async_trait]
impl Service for Ticker {
    async fn serve(&self) -> Result<(), UnitError> {
        let mut interval = tokio::time::interval(self.tick());
        let listen = self.listen();
        loop {
            tokio::select! {
                _ = self.stop.cancelled() => {
                    tracing::info!(listen = %listen, "ticker stopped");
                    return Ok(());
                }
                _ = interval.tick() => tracing::info!(listen = %listen, "tick"),
            }
        }
    }

    async fn graceful_stop(&self) {
        self.stop.cancel();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let group = Group::new(GroupConfig {
        name: Some("service".into()),
        help_text: "Demo service. Stop it with Ctrl-C.".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    });

    let signals: UnitRef = Arc::new(signal::Handler::new().with_refresh(|| {
        tracing::info!("refresh requested");
        Ok(())
    }));
    let ticker: UnitRef = Arc::new(Ticker::new());
    group.register(&[signals, ticker]);

    group.run().await?;
    Ok(())
}
