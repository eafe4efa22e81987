//! MySQL implementation of the driver traits.

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{BinaryProtocol, Conn, Opts, OptsBuilder, Params, QueryResult, Row, Value};
use query_latency_driver::{
    strip_jdbc_prefix, ConnectTarget, Connection, Driver, DriverError, ParamValue, ResultSet,
    Statement,
};
use std::borrow::Cow;
use tracing::debug;

/// Driver for `mysql://` and `mariadb://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySQLDriver;

/// Convert a (possibly JDBC-style) URL into one mysql_async accepts.
pub fn normalize_url(url: &str) -> Cow<'_, str> {
    let url = strip_jdbc_prefix(url);
    match url.strip_prefix("mariadb://") {
        Some(rest) => Cow::Owned(format!("mysql://{rest}")),
        None => Cow::Borrowed(url),
    }
}

#[async_trait]
impl Driver for MySQLDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn accepts_name(&self, name: &str) -> bool {
        matches!(
            name.trim().to_lowercase().as_str(),
            "mysql"
                | "mariadb"
                | "com.mysql.jdbc.driver"
                | "com.mysql.cj.jdbc.driver"
                | "org.mariadb.jdbc.driver"
        )
    }

    fn accepts_url(&self, url: &str) -> bool {
        normalize_url(url).starts_with("mysql://")
    }

    async fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Connection>, DriverError> {
        let opts = Opts::from_url(&normalize_url(&target.url))
            .map_err(|e| DriverError::InvalidUrl(e.to_string()))?;

        let mut builder = OptsBuilder::from_opts(opts);
        if let Some(user) = &target.user {
            builder = builder.user(Some(user.clone()));
        }
        if let Some(password) = &target.password {
            builder = builder.pass(Some(password.clone()));
        }

        let conn = Conn::new(builder)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        Ok(Box::new(MySQLConnection { conn }))
    }
}

pub struct MySQLConnection {
    conn: Conn,
}

#[async_trait]
impl Connection for MySQLConnection {
    async fn prepare<'a>(
        &'a mut self,
        sql: &str,
    ) -> Result<Box<dyn Statement + 'a>, DriverError> {
        debug!("Preparing MySQL statement: {}", sql);
        let stmt = self
            .conn
            .prep(sql)
            .await
            .map_err(|e| DriverError::Prepare(e.to_string()))?;
        let params = vec![None; stmt.num_params() as usize];

        Ok(Box::new(MySQLStatement {
            conn: &mut self.conn,
            stmt,
            params,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.conn
            .disconnect()
            .await
            .map_err(|e| DriverError::Close(e.to_string()))
    }
}

pub struct MySQLStatement<'a> {
    conn: &'a mut Conn,
    stmt: mysql_async::Statement,
    params: Vec<Option<Value>>,
}

#[async_trait]
impl Statement for MySQLStatement<'_> {
    fn bind(&mut self, index: usize, value: &ParamValue) -> Result<(), DriverError> {
        let count = self.params.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.params.get_mut(i))
            .ok_or_else(|| {
                DriverError::bind(index, format!("parameter index out of range (1..={count})"))
            })?;
        // The server converts string literals for every bind type, so object,
        // string and nstring all travel as bytes.
        *slot = Some(Value::Bytes(value.as_str().as_bytes().to_vec()));
        Ok(())
    }

    async fn execute<'s>(&'s mut self) -> Result<Box<dyn ResultSet + 's>, DriverError> {
        let mut values = Vec::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            values.push(param.clone().ok_or(DriverError::UnboundParameter(i + 1))?);
        }
        let params = if values.is_empty() {
            Params::Empty
        } else {
            Params::Positional(values)
        };

        let result = self
            .conn
            .exec_iter(self.stmt.clone(), params)
            .await
            .map_err(|e| DriverError::Execute(e.to_string()))?;
        let column_count = result.columns_ref().len();

        Ok(Box::new(MySQLResultSet {
            result,
            column_count,
            current: None,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        let MySQLStatement { conn, stmt, .. } = *self;
        conn.close(stmt)
            .await
            .map_err(|e| DriverError::Close(e.to_string()))
    }
}

pub struct MySQLResultSet<'a> {
    result: QueryResult<'a, 'static, BinaryProtocol>,
    column_count: usize,
    current: Option<Row>,
}

#[async_trait]
impl ResultSet for MySQLResultSet<'_> {
    fn column_count(&self) -> usize {
        self.column_count
    }

    async fn next(&mut self) -> Result<bool, DriverError> {
        self.current = self
            .result
            .next()
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

        Ok(row.as_ref(column - 1).and_then(value_bytes))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.result
            .drop_result()
            .await
            .map_err(|e| DriverError::Close(e.to_string()))
    }
}

/// Bytes of a column value as the text protocol would have delivered them.
pub fn value_bytes(value: &Value) -> Option<Cow<'_, [u8]>> {
    let text = match value {
        Value::NULL => return None,
        Value::Bytes(bytes) => return Some(Cow::Borrowed(bytes.as_slice())),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        other => other.as_sql(true).trim_matches('\'').to_string(),
    };
    Some(Cow::Owned(text.into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("jdbc:mysql://localhost:3306/db"),
            "mysql://localhost:3306/db"
        );
        assert_eq!(
            normalize_url("jdbc:mariadb://localhost/db"),
            "mysql://localhost/db"
        );
        assert_eq!(normalize_url("mysql://localhost/db"), "mysql://localhost/db");
    }

    #[test]
    fn test_accepts_jdbc_class_names() {
        let driver = MySQLDriver;
        assert!(driver.accepts_name("com.mysql.cj.jdbc.Driver"));
        assert!(driver.accepts_name("com.mysql.jdbc.Driver"));
        assert!(driver.accepts_name("org.mariadb.jdbc.Driver"));
        assert!(!driver.accepts_name("org.postgresql.Driver"));
        assert!(driver.accepts_url("jdbc:mysql://localhost/db"));
        assert!(!driver.accepts_url("postgresql://localhost/db"));
    }

    #[test]
    fn test_value_bytes() {
        assert!(value_bytes(&Value::NULL).is_none());
        assert_eq!(
            value_bytes(&Value::Bytes(b"abc".to_vec())).unwrap().as_ref(),
            b"abc"
        );
        assert_eq!(value_bytes(&Value::Int(-42)).unwrap().as_ref(), b"-42");
        assert_eq!(value_bytes(&Value::UInt(7)).unwrap().as_ref(), b"7");
    }

    #[test]
    fn test_value_bytes_date_is_unquoted() {
        let date = Value::Date(2024, 1, 15, 10, 30, 0, 0);
        let bytes = value_bytes(&date).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with("2024-01-15"));
        assert!(!text.contains('\''));
    }
}
