// Driver: connection registry and the session-facing API.
//
// Every distinct connection string gets its own engine. Sessions opened
// against the same string share that engine and therefore its relations.

mod dsn;
mod session;
mod statement;
mod transaction;

pub use dsn::{normalize, parse_duration, ConnConfig, DEFAULT_DSN};
pub use session::{ExecResult, Rows, Session};
pub use statement::Statement;
pub use transaction::{IsolationLevel, Transaction, TxOptions};

use crate::config::EngineConfig;
use crate::core::Result;
use crate::engine::Engine;
use crate::protocol::{channel_endpoints, DriverEndpoint};
use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One engine and the endpoint sessions reach it through.
pub struct Server {
    dsn: String,
    config: ConnConfig,
    endpoint: DriverEndpoint,
    engine: Engine,
    timeout: Option<Duration>,
    // Live sessions. Guarded separately from the registry lock.
    conn_count: Mutex<i64>,
    next_session: AtomicU64,
}

impl Server {
    fn start(dsn: &str, config: ConnConfig, engine_config: &EngineConfig) -> Result<Self> {
        let (endpoint, engine_endpoint) = channel_endpoints(engine_config.channel_capacity);
        let engine = Engine::new(engine_endpoint, &config)?;
        Ok(Self::with_endpoint(dsn, config, endpoint, engine, engine_config))
    }

    fn with_endpoint(
        dsn: &str,
        config: ConnConfig,
        endpoint: DriverEndpoint,
        engine: Engine,
        engine_config: &EngineConfig,
    ) -> Self {
        let timeout = config.timeout.or_else(|| engine_config.default_timeout());
        Self {
            dsn: dsn.to_string(),
            config,
            endpoint,
            engine,
            timeout,
            conn_count: Mutex::new(0),
            next_session: AtomicU64::new(1),
        }
    }

    /// Opens a new session against this server's engine.
    pub fn connect(self: &Arc<Self>) -> Result<Session> {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let conn = self.endpoint.connect(format!("{}#{id}", self.dsn))?;
        *self.conn_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(Session::new(conn, Arc::clone(self), self.timeout))
    }

    pub(crate) fn closing_conn(&self) {
        *self.conn_count.lock().unwrap_or_else(PoisonError::into_inner) -= 1;
    }

    #[must_use]
    pub fn session_count(&self) -> i64 {
        *self.conn_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    #[must_use]
    pub const fn config(&self) -> &ConnConfig {
        &self.config
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn stop(&self) {
        self.engine.stop();
    }
}

/// Registry of servers keyed by connection string.
///
/// An owned value rather than a process global, so independent registries
/// can coexist (one per test, for example).
pub struct Driver {
    config: EngineConfig,
    servers: Mutex<HashMap<String, Arc<Server>>>,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Driver {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a driver from `inmemsql.toml` and `INMEMSQL_*` variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(EngineConfig::load()?))
    }

    /// Returns the server for `dsn`, starting its engine on first use.
    pub fn connector(&self, dsn: &str) -> Result<Arc<Server>> {
        let config = ConnConfig::parse(dsn)?;
        let key = normalize(dsn);

        let mut servers = self.servers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(server) = servers.get(key) {
            if server.is_running() {
                return Ok(Arc::clone(server));
            }
        }

        let server = Arc::new(Server::start(key, config, &self.config)?);
        servers.insert(key.to_string(), Arc::clone(&server));
        info!("registered engine for '{key}'");
        Ok(server)
    }

    /// Opens a session, starting the engine for `dsn` if needed.
    pub fn open(&self, dsn: &str) -> Result<Session> {
        self.connector(dsn)?.connect()
    }

    /// Stops the engine for `dsn` and forgets it. Sessions still open on it
    /// fail with `EngineStopped` from then on.
    pub fn close(&self, dsn: &str) -> bool {
        let removed = self
            .servers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(normalize(dsn));
        match removed {
            Some(server) => {
                server.stop();
                info!("closed engine for '{}'", server.dsn());
                true
            }
            None => false,
        }
    }

    /// Stops every engine.
    pub fn shutdown(&self) {
        let servers: Vec<_> = self
            .servers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, server)| server)
            .collect();
        for server in servers {
            server.stop();
        }
    }

    #[must_use]
    pub fn engine_count(&self) -> usize {
        self.servers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .field("engines", &self.engine_count())
            .finish()
    }
}
