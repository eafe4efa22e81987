//! MySQL driver for query-latency
//!
//! Implements the JDBC-style driver traits on top of mysql_async. Statements
//! are prepared server-side and executed with the binary protocol; rows are
//! streamed from the `QueryResult` one at a time.

mod connection;

pub use connection::{
    normalize_url, value_bytes, MySQLConnection, MySQLDriver, MySQLResultSet, MySQLStatement,
};
