//! PostgreSQL implementation of the driver traits.

use crate::param::PgParam;
use async_trait::async_trait;
use futures::TryStreamExt;
use query_latency_driver::{
    placeholder_offsets, strip_jdbc_prefix, ConnectTarget, Connection, Driver, DriverError,
    ParamValue, ResultSet, Statement,
};
use std::borrow::Cow;
use std::pin::Pin;
use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{Client, Config, NoTls, Row, RowStream};
use tracing::debug;

/// Driver for `postgresql://` and `postgres://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgreSQLDriver;

#[async_trait]
impl Driver for PostgreSQLDriver {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn accepts_name(&self, name: &str) -> bool {
        matches!(
            name.trim().to_lowercase().as_str(),
            "postgresql" | "postgres" | "pgsql" | "org.postgresql.driver"
        )
    }

    fn accepts_url(&self, url: &str) -> bool {
        let url = strip_jdbc_prefix(url);
        url.starts_with("postgresql://") || url.starts_with("postgres://")
    }

    async fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Connection>, DriverError> {
        let mut config: Config = strip_jdbc_prefix(&target.url)
            .parse()
            .map_err(|e: tokio_postgres::Error| DriverError::InvalidUrl(e.to_string()))?;
        if let Some(user) = &target.user {
            config.user(user.as_str());
        }
        if let Some(password) = &target.password {
            config.password(password.as_str());
        }

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        // Spawn the connection task
        let task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Box::new(PostgreSQLConnection { client, task }))
    }
}

/// Rewrite `?` placeholders into PostgreSQL's `$1`, `$2`, ... form.
pub fn rewrite_placeholders(query: &str) -> String {
    let offsets = placeholder_offsets(query);
    let mut rewritten = String::with_capacity(query.len() + offsets.len() * 2);
    let mut last = 0;
    for (n, offset) in offsets.iter().enumerate() {
        rewritten.push_str(&query[last..*offset]);
        rewritten.push_str(&format!("${}", n + 1));
        last = offset + 1;
    }
    rewritten.push_str(&query[last..]);
    rewritten
}

pub struct PostgreSQLConnection {
    client: Client,
    task: JoinHandle<()>,
}

#[async_trait]
impl Connection for PostgreSQLConnection {
    async fn prepare<'a>(
        &'a mut self,
        sql: &str,
    ) -> Result<Box<dyn Statement + 'a>, DriverError> {
        let sql = rewrite_placeholders(sql);
        debug!("Preparing PostgreSQL statement: {}", sql);

        let statement = self
            .client
            .prepare(&sql)
            .await
            .map_err(|e| DriverError::Prepare(e.to_string()))?;
        let params = vec![None; statement.params().len()];

        Ok(Box::new(PostgreSQLStatement {
            client: &self.client,
            statement,
            params,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        let PostgreSQLConnection { client, task } = *self;
        // The connection task finishes once every client handle is gone.
        drop(client);
        task.await.map_err(|e| DriverError::Close(e.to_string()))
    }
}

pub struct PostgreSQLStatement<'a> {
    client: &'a Client,
    statement: tokio_postgres::Statement,
    params: Vec<Option<PgParam>>,
}

#[async_trait]
impl Statement for PostgreSQLStatement<'_> {
    fn bind(&mut self, index: usize, value: &ParamValue) -> Result<(), DriverError> {
        let count = self.params.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.params.get_mut(i))
            .ok_or_else(|| {
                DriverError::bind(index, format!("parameter index out of range (1..={count})"))
            })?;
        *slot = Some(PgParam::from(value));
        Ok(())
    }

    async fn execute<'s>(&'s mut self) -> Result<Box<dyn ResultSet + 's>, DriverError> {
        let mut params = Vec::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            params.push(param.as_ref().ok_or(DriverError::UnboundParameter(i + 1))?);
        }

        let stream = self
            .client
            .query_raw(&self.statement, params)
            .await
            .map_err(|e| DriverError::Execute(e.to_string()))?;

        Ok(Box::new(PostgreSQLResultSet {
            stream: Box::pin(stream),
            column_count: self.statement.columns().len(),
            current: None,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        // Dropping the last handle sends the Close message for the statement.
        drop(self);
        Ok(())
    }
}

pub struct PostgreSQLResultSet {
    stream: Pin<Box<RowStream>>,
    column_count: usize,
    current: Option<Row>,
}

#[async_trait]
impl ResultSet for PostgreSQLResultSet {
    fn column_count(&self) -> usize {
        self.column_count
    }

    async fn next(&mut self) -> Result<bool, DriverError> {
        self.current = self
            .stream
            .try_next()
            .await
            .map_err(|e| DriverError::Fetch(e.to_string()))?;
        Ok(self.current.is_some())
    }

    fn bytes(&self, column: usize) -> Result<Option<Cow<'_, [u8]>>, DriverError> {
        if column == 0 || column > self.column_count {
            return Err(DriverError::ColumnOutOfRange {
                index: column,
                count: self.column_count,
            });
        }
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| DriverError::Fetch("no current row".to_string()))?;

        let raw: Option<RawBytes<'_>> = row
            .try_get(column - 1)
            .map_err(|e| DriverError::Fetch(e.to_string()))?;
        Ok(raw.map(|r| Cow::Borrowed(r.0)))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        // Unread rows are discarded by the connection task.
        drop(self);
        Ok(())
    }
}

/// Wire representation of a column value, whatever its type.
struct RawBytes<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawBytes<'a> {
    fn from_sql(
        _: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(RawBytes(raw))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_placeholders() {
        assert_eq!(
            rewrite_placeholders("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = $2"
        );
    }

    #[test]
    fn test_rewrite_keeps_literal_question_marks() {
        assert_eq!(
            rewrite_placeholders("SELECT '?' FROM t WHERE a = ?"),
            "SELECT '?' FROM t WHERE a = $1"
        );
    }

    #[test]
    fn test_rewrite_without_placeholders() {
        assert_eq!(rewrite_placeholders("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_accepts_jdbc_names_and_urls() {
        let driver = PostgreSQLDriver;
        assert!(driver.accepts_name("org.postgresql.Driver"));
        assert!(driver.accepts_name("postgres"));
        assert!(!driver.accepts_name("com.mysql.jdbc.Driver"));
        assert!(driver.accepts_url("jdbc:postgresql://localhost:5432/db"));
        assert!(driver.accepts_url("postgres://localhost/db"));
        assert!(!driver.accepts_url("mysql://localhost/db"));
    }
}
