//! PostgreSQL-backed connector
//!
//! Blocking client over the `postgres` crate. Errors are classified once,
//! here, so that callers never inspect driver messages.

use std::error::Error as StdError;
use std::io;

use postgres::{Client, Config, NoTls};

use super::errors::{ConnectorError, ConnectorResult};
use super::target::ConnectionTarget;
use super::{Connection, Connector};

/// Role used when neither the target nor the environment names one.
const FALLBACK_USER: &str = "gpadmin";

/// Opens plain-text sessions against a primary.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

impl PgConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }

    fn config_for(target: &ConnectionTarget) -> Config {
        let user = target
            .user
            .clone()
            .or_else(|| std::env::var("PGUSER").ok())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| FALLBACK_USER.to_string());

        let mut config = Config::new();
        config
            .host(&target.host)
            .port(target.port)
            .dbname(&target.database)
            .user(&user)
            .connect_timeout(target.connect_timeout);
        if let Some(options) = target.options() {
            config.options(options);
        }
        config
    }
}

impl Connector for PgConnector {
    fn connect(&self, target: &ConnectionTarget) -> ConnectorResult<Box<dyn Connection>> {
        let client = Self::config_for(target)
            .connect(NoTls)
            .map_err(|e| ConnectorError::connection(target.address(), e.to_string()))?;

        Ok(Box::new(PgConnection {
            client,
            address: target.address(),
        }))
    }
}

/// An open session.
pub struct PgConnection {
    client: Client,
    address: String,
}

impl Connection for PgConnection {
    fn query_singleton(&mut self, sql: &str) -> ConnectorResult<i64> {
        let row = self
            .client
            .query_one(sql, &[])
            .map_err(|e| classify(&self.address, e))?;
        row.try_get::<_, i64>(0)
            .map_err(|e| ConnectorError::statement(e.to_string()))
    }

    fn query(&mut self, sql: &str) -> ConnectorResult<()> {
        self.client
            .batch_execute(sql)
            .map_err(|e| classify(&self.address, e))
    }
}

/// Server-reported errors are statement failures; a dead session or socket
/// error is a connection failure; anything else the driver raises about the
/// result shape is treated as a statement failure.
fn classify(address: &str, err: postgres::Error) -> ConnectorError {
    if let Some(db) = err.as_db_error() {
        return ConnectorError::statement_with_state(db.message(), db.code().code());
    }
    let io_failure = err
        .source()
        .map(|source| source.is::<io::Error>())
        .unwrap_or(false);
    if err.is_closed() || io_failure {
        return ConnectorError::connection(address, err.to_string());
    }
    ConnectorError::statement(err.to_string())
}
