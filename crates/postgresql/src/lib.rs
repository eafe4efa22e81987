//! PostgreSQL driver for query-latency
//!
//! Implements the JDBC-style driver traits on top of tokio-postgres. Queries
//! use `?` placeholders, which are rewritten to `$n` before preparing.
//! Results are streamed with `query_raw`, so execution time covers the round
//! trip up to the first response and fetch time covers reading the rows.

mod connection;
mod param;

pub use connection::{
    rewrite_placeholders, PostgreSQLConnection, PostgreSQLDriver, PostgreSQLResultSet,
    PostgreSQLStatement,
};
