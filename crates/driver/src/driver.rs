//! Driver, connection, statement and result-set traits.

use crate::error::DriverError;
use crate::param::ParamValue;
use async_trait::async_trait;
use std::borrow::Cow;

/// Where and as whom to connect.
#[derive(Debug, Clone, Default)]
pub struct ConnectTarget {
    /// Connection URL, with or without a leading `jdbc:`.
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ConnectTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }
}

/// Entry point of a database driver.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Short driver name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this driver understands the given identifier (short name or
    /// JDBC class name).
    fn accepts_name(&self, name: &str) -> bool;

    /// Whether this driver understands the given URL (after `jdbc:` removal).
    fn accepts_url(&self, url: &str) -> bool;

    /// Open a single connection.
    async fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Connection>, DriverError>;
}

/// An open database connection.
#[async_trait]
pub trait Connection: Send {
    /// Prepare a statement using `?` placeholders.
    async fn prepare<'a>(&'a mut self, sql: &str)
        -> Result<Box<dyn Statement + 'a>, DriverError>;

    /// Close the connection.
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}

/// A prepared statement with positional parameters.
#[async_trait]
pub trait Statement: Send {
    /// Bind `value` to the 1-based placeholder `index`.
    fn bind(&mut self, index: usize, value: &ParamValue) -> Result<(), DriverError>;

    /// Execute with the current bindings. Returns once the server answered,
    /// rows are pulled lazily through the returned cursor.
    async fn execute<'a>(&'a mut self) -> Result<Box<dyn ResultSet + 'a>, DriverError>;

    /// Release the server-side statement.
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}

/// A forward-only, read-only cursor over query results.
#[async_trait]
pub trait ResultSet: Send {
    fn column_count(&self) -> usize;

    /// Advance to the next row. Returns `false` once the results are exhausted.
    async fn next(&mut self) -> Result<bool, DriverError>;

    /// Raw bytes of the 1-based `column` in the current row, `None` for NULL.
    fn bytes(&self, column: usize) -> Result<Option<Cow<'_, [u8]>>, DriverError>;

    /// Discard any remaining rows and release the cursor.
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}
