//! Connection descriptor for a single primary

use std::fmt;
use std::time::Duration;

/// Database used for catalog queries when none is configured.
pub const DEFAULT_DATABASE: &str = "template1";

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to open a session against a primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Host name or address
    pub host: String,
    /// Postmaster port
    pub port: u16,
    /// Database to connect to
    pub database: String,
    /// Role name; the driver default applies when `None`
    pub user: Option<String>,
    /// Connect in utility mode (`gp_role=utility`), bypassing dispatch
    pub utility_mode: bool,
    /// Upper bound on connection establishment
    pub connect_timeout: Duration,
}

impl ConnectionTarget {
    /// Target with default database, utility mode on.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database: DEFAULT_DATABASE.to_string(),
            user: None,
            utility_mode: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the role name.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Toggle utility mode.
    pub fn with_utility_mode(mut self, utility_mode: bool) -> Self {
        self.utility_mode = utility_mode;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `host:port`, used in error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Startup options passed to the server.
    pub fn options(&self) -> Option<&'static str> {
        if self.utility_mode {
            Some("-c gp_role=utility")
        } else {
            None
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.database)
    }
}
