//! Bind values for PostgreSQL prepared statements.
//!
//! PostgreSQL infers a type for every `$n` parameter when the statement is
//! prepared, and tokio-postgres sends parameters in binary form. An `object`
//! parameter therefore has to be converted from its literal text into the
//! inferred type before encoding; `string` parameters are only accepted where
//! the server expects text.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use query_latency_driver::ParamValue;
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PgParam {
    /// Literal coerced to the server-inferred type.
    Object(String),
    /// Text bound as-is.
    Text(String),
}

impl From<&ParamValue> for PgParam {
    fn from(value: &ParamValue) -> Self {
        match value {
            ParamValue::Object(v) => PgParam::Object(v.clone()),
            // PostgreSQL has no separate national character type.
            ParamValue::Str(v) | ParamValue::NStr(v) => PgParam::Text(v.clone()),
        }
    }
}

impl ToSql for PgParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            PgParam::Text(text) => {
                if !<String as ToSql>::accepts(ty) {
                    return Err(
                        format!("cannot bind a string to a parameter of type {ty}").into(),
                    );
                }
                text.to_sql(ty, out)
            }
            PgParam::Object(literal) => coerce_literal(literal, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    postgres_types::to_sql_checked!();
}

/// Encode `literal` as a value of type `ty`.
fn coerce_literal(literal: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    let literal = literal.trim();
    match *ty {
        Type::BOOL => parse_bool(literal)?.to_sql(ty, out),
        Type::INT2 => literal.parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => literal.parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => literal.parse::<i64>()?.to_sql(ty, out),
        Type::OID => literal.parse::<u32>()?.to_sql(ty, out),
        Type::FLOAT4 => literal.parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => literal.parse::<f64>()?.to_sql(ty, out),
        Type::NUMERIC => Decimal::from_str(literal)?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(literal)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => {
            serde_json::from_str::<serde_json::Value>(literal)?.to_sql(ty, out)
        }
        Type::DATE => NaiveDate::parse_from_str(literal, "%Y-%m-%d")?.to_sql(ty, out),
        Type::TIME => NaiveTime::from_str(literal)?.to_sql(ty, out),
        Type::TIMESTAMP => parse_naive_datetime(literal)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_datetime_utc(literal)?.to_sql(ty, out),
        Type::BYTEA => literal.as_bytes().to_sql(ty, out),
        _ if <&str as ToSql>::accepts(ty) => literal.to_sql(ty, out),
        _ => Err(format!("cannot convert '{literal}' to parameter type {ty}").into()),
    }
}

fn parse_bool(literal: &str) -> Result<bool, BoxError> {
    match literal.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(format!("invalid boolean literal: {literal}").into()),
    }
}

fn parse_naive_datetime(literal: &str) -> Result<NaiveDateTime, BoxError> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(literal, format) {
            return Ok(dt);
        }
    }
    Err(format!("invalid timestamp literal: {literal}").into())
}

fn parse_datetime_utc(literal: &str) -> Result<DateTime<Utc>, BoxError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(literal) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Timestamps without an offset are taken as UTC.
    Ok(parse_naive_datetime(literal)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(param: &PgParam, ty: &Type) -> Result<Vec<u8>, BoxError> {
        let mut out = BytesMut::new();
        param.to_sql(ty, &mut out)?;
        Ok(out.to_vec())
    }

    #[test]
    fn test_object_coerces_to_int4() {
        let bytes = encode(&PgParam::Object("42".to_string()), &Type::INT4).unwrap();
        assert_eq!(bytes, 42i32.to_be_bytes().to_vec());
    }

    #[test]
    fn test_object_coerces_to_int8_with_whitespace() {
        let bytes = encode(&PgParam::Object(" 7 ".to_string()), &Type::INT8).unwrap();
        assert_eq!(bytes, 7i64.to_be_bytes().to_vec());
    }

    #[test]
    fn test_object_coerces_to_bool() {
        let yes = encode(&PgParam::Object("t".to_string()), &Type::BOOL).unwrap();
        let no = encode(&PgParam::Object("false".to_string()), &Type::BOOL).unwrap();
        assert_eq!(yes, vec![1]);
        assert_eq!(no, vec![0]);
    }

    #[test]
    fn test_object_to_text_is_verbatim() {
        let bytes = encode(&PgParam::Object("hello".to_string()), &Type::TEXT).unwrap();
        assert_eq!(bytes, b"hello".to_vec());
    }

    #[test]
    fn test_object_invalid_integer_fails() {
        assert!(encode(&PgParam::Object("abc".to_string()), &Type::INT4).is_err());
    }

    #[test]
    fn test_text_rejected_for_integer_parameter() {
        assert!(encode(&PgParam::Text("42".to_string()), &Type::INT4).is_err());
    }

    #[test]
    fn test_text_accepted_for_varchar_parameter() {
        let bytes = encode(&PgParam::Text("42".to_string()), &Type::VARCHAR).unwrap();
        assert_eq!(bytes, b"42".to_vec());
    }

    #[test]
    fn test_timestamptz_without_offset_is_utc() {
        let dt = parse_datetime_utc("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_nstring_maps_to_text() {
        let param = PgParam::from(&ParamValue::NStr("x".to_string()));
        assert_eq!(param, PgParam::Text("x".to_string()));
    }
}
