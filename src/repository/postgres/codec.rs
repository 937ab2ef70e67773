//! Driver row to [`Value`] conversion, keyed on the driver-reported type.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo};
use tracing::debug;
use uuid::Uuid;

use crate::core::Value;
use crate::models::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Numeric,
    Boolean,
    Text,
    Uuid,
    Json,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Other,
}

impl CellKind {
    pub fn from_type_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "INT2" => Self::SmallInt,
            "INT4" => Self::Int,
            "INT8" => Self::BigInt,
            "FLOAT4" => Self::Real,
            "FLOAT8" => Self::Double,
            "NUMERIC" | "DECIMAL" => Self::Numeric,
            "BOOL" => Self::Boolean,
            "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" => Self::Text,
            "UUID" => Self::Uuid,
            "JSON" | "JSONB" => Self::Json,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMESTAMP" => Self::Timestamp,
            "TIMESTAMPTZ" => Self::TimestampTz,
            _ => Self::Other,
        }
    }
}

/// Whether a column of this catalog `data_type` decodes into a typed
/// [`Value`]. Anything else (enums, intervals, arrays, network types) has to
/// be selected as text to survive decoding.
pub fn reads_natively(data_type: &str) -> bool {
    matches!(
        data_type.trim().to_ascii_lowercase().as_str(),
        "smallint"
            | "integer"
            | "bigint"
            | "real"
            | "double precision"
            | "numeric"
            | "boolean"
            | "text"
            | "character varying"
            | "character"
            | "name"
            | "uuid"
            | "json"
            | "jsonb"
            | "date"
            | "time without time zone"
            | "timestamp without time zone"
            | "timestamp with time zone"
    )
}

/// The forms a decimal can arrive in before it is turned into a float.
#[derive(Debug, Clone, Copy)]
pub enum NumericSource<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Number(f64),
}

/// Parse a decimal into a float; `Null` when it is not a number.
pub fn numeric_value(source: NumericSource<'_>) -> Value {
    let parsed = match source {
        NumericSource::Text(text) => text.trim().parse::<f64>().ok(),
        NumericSource::Bytes(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.trim().parse::<f64>().ok()),
        NumericSource::Number(number) => Some(number),
    };
    parsed.map_or(Value::Null, Value::Float)
}

pub fn decode_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_column(row, column.ordinal())))
        .collect()
}

/// Decode one cell. Undecodable cells become `Null`.
pub fn decode_column(row: &PgRow, index: usize) -> Value {
    let type_name = row.column(index).type_info().name();

    let decoded: Result<Value, sqlx::Error> = match CellKind::from_type_name(type_name) {
        CellKind::SmallInt => row.try_get::<Option<i16>, _>(index).map(|v| Value::from(v.map(i64::from))),
        CellKind::Int => row.try_get::<Option<i32>, _>(index).map(|v| Value::from(v.map(i64::from))),
        CellKind::BigInt => row.try_get::<Option<i64>, _>(index).map(Value::from),
        CellKind::Real => row.try_get::<Option<f32>, _>(index).map(|v| Value::from(v.map(f64::from))),
        CellKind::Double => row.try_get::<Option<f64>, _>(index).map(Value::from),
        CellKind::Numeric => row.try_get::<Option<BigDecimal>, _>(index).map(|v| {
            v.map_or(Value::Null, |d| numeric_value(NumericSource::Text(&d.to_string())))
        }),
        CellKind::Boolean => row.try_get::<Option<bool>, _>(index).map(Value::from),
        CellKind::Text => row.try_get::<Option<String>, _>(index).map(Value::from),
        CellKind::Uuid => row
            .try_get::<Option<Uuid>, _>(index)
            .map(|v| Value::from(v.map(|id| id.to_string()))),
        CellKind::Json => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .map(|v| Value::from(v.map(|json| json.to_string()))),
        CellKind::Date => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| v.map_or(Value::Null, Value::Date)),
        CellKind::Time => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map(|v| v.map_or(Value::Null, Value::Time)),
        CellKind::Timestamp => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map_or(Value::Null, |ts| Value::Timestamp(ts.and_utc()))),
        CellKind::TimestampTz => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|v| v.map_or(Value::Null, Value::Timestamp)),
        CellKind::Other => row.try_get::<Option<String>, _>(index).map(Value::from),
    };

    decoded.unwrap_or_else(|err| {
        debug!(column = index, type_name, error = %err, "cell not decodable, emitting null");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_driver_type_names() {
        assert_eq!(CellKind::from_type_name("NUMERIC"), CellKind::Numeric);
        assert_eq!(CellKind::from_type_name("decimal"), CellKind::Numeric);
        assert_eq!(CellKind::from_type_name("TIMESTAMPTZ"), CellKind::TimestampTz);
        assert_eq!(CellKind::from_type_name("TIMESTAMP"), CellKind::Timestamp);
        assert_eq!(CellKind::from_type_name("TIME"), CellKind::Time);
        assert_eq!(CellKind::from_type_name("VARCHAR"), CellKind::Text);
        assert_eq!(CellKind::from_type_name("mood"), CellKind::Other);
    }

    #[test]
    fn only_decodable_catalog_types_read_natively() {
        for native in ["integer", "numeric", "character varying", "timestamp with time zone", "jsonb"] {
            assert!(reads_natively(native), "{native}");
        }
        for other in ["USER-DEFINED", "interval", "ARRAY", "inet", "time with time zone", "bytea"] {
            assert!(!reads_natively(other), "{other}");
        }
    }

    #[test]
    fn numeric_accepts_text_bytes_and_numbers() {
        assert_eq!(numeric_value(NumericSource::Text("12.50")), Value::Float(12.5));
        assert_eq!(numeric_value(NumericSource::Bytes(b"-3.25")), Value::Float(-3.25));
        assert_eq!(numeric_value(NumericSource::Number(7.0)), Value::Float(7.0));
    }

    #[test]
    fn unparseable_numeric_is_null() {
        assert_eq!(numeric_value(NumericSource::Text("abc")), Value::Null);
        assert_eq!(numeric_value(NumericSource::Bytes(&[0xff, 0xfe])), Value::Null);
    }
}
