//! JDBC-style driver abstraction for query-latency.
//!
//! A [`Driver`] opens a [`Connection`], which prepares a [`Statement`] with
//! `?` placeholders. Executing the statement yields a forward-only
//! [`ResultSet`] cursor. Each handle borrows its parent, so a result set can
//! never outlive its statement and a statement can never outlive its
//! connection.
//!
//! Concrete drivers live in their own crates:
//!
//! - `query_latency_postgresql` - PostgreSQL via tokio-postgres
//! - `query_latency_mysql` - MySQL and MariaDB via mysql_async
//!
//! The [`bind`] module turns configuration values (`p1`, `p2`, ...) into
//! typed bind calls on a prepared statement.

pub mod bind;
pub mod driver;
pub mod error;
pub mod param;
pub mod sql;

pub use bind::{bind_parameters, resolve_parameters};
pub use driver::{ConnectTarget, Connection, Driver, ResultSet, Statement};
pub use error::DriverError;
pub use param::{ParamType, ParamValue, ParameterSpec};
pub use sql::{count_placeholders, placeholder_offsets, strip_jdbc_prefix};
