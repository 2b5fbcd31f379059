//! Remote query connector
//!
//! The slot manager talks to a primary only through these traits:
//! - [`Connector::connect`] opens a session for a [`ConnectionTarget`]
//! - [`Connection::query_singleton`] returns the first column of the single result row
//! - [`Connection::query`] runs a statement and discards its output
//!
//! Failures are [`ConnectorError::Connection`] or [`ConnectorError::Statement`].

mod errors;
mod pg;
mod target;

pub use errors::{ConnectorError, ConnectorResult};
pub use pg::{PgConnection, PgConnector};
pub use target::{ConnectionTarget, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DATABASE};

/// Opens sessions against a primary.
pub trait Connector: Send + Sync {
    /// Open a session. Failing to reach or authenticate is a connection error.
    fn connect(&self, target: &ConnectionTarget) -> ConnectorResult<Box<dyn Connection>>;
}

/// An open session.
pub trait Connection {
    /// Run a query returning exactly one integer scalar.
    fn query_singleton(&mut self, sql: &str) -> ConnectorResult<i64>;

    /// Run a statement, discarding any rows.
    fn query(&mut self, sql: &str) -> ConnectorResult<()>;
}

/// Quote a value as a SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("s1"), "'s1'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }
}
