use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AdminError, AdminResult, Value};

/// UI-facing field kind reported by `/api/table-fields`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizedType {
    Integer,
    Float,
    Boolean,
    Text,
    Date,
    Time,
    Timestamp,
    Select,
}

impl NormalizedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for NormalizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a catalog type name onto a field kind. Unrecognized types are `Text`.
///
/// `Select` is never produced here; it is assigned by the caller when the
/// column is a foreign key.
pub fn normalize(raw_type: &str) -> NormalizedType {
    match raw_type.trim().to_ascii_lowercase().as_str() {
        "integer" | "bigint" | "smallint" | "int" | "int2" | "int4" | "int8" => {
            NormalizedType::Integer
        }
        "real" | "double precision" | "numeric" | "decimal" | "float4" | "float8" => {
            NormalizedType::Float
        }
        "boolean" | "bool" => NormalizedType::Boolean,
        "text" | "character varying" | "character" | "varchar" | "char" | "bpchar" => {
            NormalizedType::Text
        }
        "date" => NormalizedType::Date,
        "timestamp without time zone" | "timestamp" => NormalizedType::Timestamp,
        "time without time zone" | "time" => NormalizedType::Time,
        _ => NormalizedType::Text,
    }
}

/// Raw type information for one column, as reported by
/// `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// `data_type`, e.g. `integer` or `timestamp with time zone`.
    pub data_type: String,
    /// Schema of the underlying type, e.g. `pg_catalog`.
    pub udt_schema: String,
    /// Underlying type name, e.g. `int4`. Used as the cast target of write
    /// placeholders.
    pub udt_name: String,
}

impl ColumnType {
    pub fn new(
        data_type: impl Into<String>,
        udt_schema: impl Into<String>,
        udt_name: impl Into<String>,
    ) -> Self {
        Self {
            data_type: data_type.into(),
            udt_schema: udt_schema.into(),
            udt_name: udt_name.into(),
        }
    }

    pub fn write_class(&self) -> WriteClass {
        WriteClass::of(&self.data_type)
    }
}

/// How an incoming JSON value is converted before it is bound to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteClass {
    Integer,
    Boolean,
    Timestamp,
    Time,
    Numeric,
    Other,
}

impl WriteClass {
    pub fn of(data_type: &str) -> Self {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "integer" | "bigint" | "smallint" => Self::Integer,
            "boolean" => Self::Boolean,
            "timestamp with time zone" | "timestamp without time zone" => Self::Timestamp,
            "time" | "time without time zone" => Self::Time,
            "numeric" | "float" | "real" | "double precision" => Self::Numeric,
            _ => Self::Other,
        }
    }
}

/// Convert one write-payload value for a column of the given type.
pub fn convert_for_write(
    column: &str,
    column_type: &ColumnType,
    json: &serde_json::Value,
) -> AdminResult<Value> {
    use serde_json::Value as Json;

    match column_type.write_class() {
        WriteClass::Integer | WriteClass::Other => Ok(Value::from_json(json)),
        WriteClass::Boolean => Ok(Value::Boolean(
            matches!(json, Json::Bool(true)) || matches!(json, Json::String(s) if s == "true"),
        )),
        WriteClass::Timestamp => match json {
            Json::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|err| {
                    AdminError::validation(format!("Invalid timestamp format for {column}: {err}"))
                }),
            _ => Ok(Value::Null),
        },
        WriteClass::Time => match json {
            Json::String(s) => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .map(Value::Time)
                .map_err(|err| {
                    AdminError::validation(format!("Invalid time format for {column}: {err}"))
                }),
            _ => Ok(Value::Null),
        },
        WriteClass::Numeric => match json {
            Json::String(s) => s
                .replacen(',', ".", 1)
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|err| {
                    AdminError::validation(format!("Invalid number format for {column}: {err}"))
                }),
            Json::Number(n) => Ok(n.as_f64().map_or(Value::Null, Value::Float)),
            _ => Ok(Value::Null),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn typed(data_type: &str) -> ColumnType {
        ColumnType::new(data_type, "pg_catalog", "unused")
    }

    #[test]
    fn normalizes_catalog_type_names() {
        let cases = [
            ("integer", NormalizedType::Integer),
            ("BIGINT", NormalizedType::Integer),
            ("smallint", NormalizedType::Integer),
            ("real", NormalizedType::Float),
            ("double precision", NormalizedType::Float),
            ("Numeric", NormalizedType::Float),
            ("boolean", NormalizedType::Boolean),
            ("text", NormalizedType::Text),
            ("character varying", NormalizedType::Text),
            ("character", NormalizedType::Text),
            ("date", NormalizedType::Date),
            ("timestamp without time zone", NormalizedType::Timestamp),
            ("time without time zone", NormalizedType::Time),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize(raw), expected, "raw type {raw}");
        }
    }

    #[test]
    fn unrecognized_types_fall_back_to_text() {
        for raw in ["uuid", "jsonb", "timestamp with time zone", "USER-DEFINED", "", "ARRAY"] {
            assert_eq!(normalize(raw), NormalizedType::Text, "raw type {raw:?}");
        }
    }

    #[test]
    fn field_kinds_serialize_lowercase() {
        assert_eq!(
            serde_json::to_value(NormalizedType::Select).unwrap(),
            json!("select")
        );
    }

    #[test]
    fn boolean_accepts_true_or_string_true_only() {
        let ty = typed("boolean");
        assert_eq!(convert_for_write("b", &ty, &json!(true)).unwrap(), Value::Boolean(true));
        assert_eq!(convert_for_write("b", &ty, &json!("true")).unwrap(), Value::Boolean(true));
        assert_eq!(convert_for_write("b", &ty, &json!("yes")).unwrap(), Value::Boolean(false));
        assert_eq!(convert_for_write("b", &ty, &json!(1)).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn numeric_replaces_first_comma() {
        let ty = typed("numeric");
        assert_eq!(convert_for_write("n", &ty, &json!("12,5")).unwrap(), Value::Float(12.5));
        assert_eq!(convert_for_write("n", &ty, &json!(3)).unwrap(), Value::Float(3.0));
        let err = convert_for_write("n", &ty, &json!("1,2,3")).unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }

    #[test]
    fn timestamps_require_rfc3339() {
        let ty = typed("timestamp with time zone");
        let value = convert_for_write("t", &ty, &json!("2024-05-01T10:00:00+02:00")).unwrap();
        let Value::Timestamp(ts) = value else {
            panic!("expected timestamp, got {value:?}");
        };
        assert_eq!(ts.to_rfc3339(), "2024-05-01T08:00:00+00:00");

        let err = convert_for_write("t", &ty, &json!("2024-05-01 10:00")).unwrap_err();
        assert!(err.to_string().contains("Invalid timestamp format for t"));
        assert_eq!(convert_for_write("t", &ty, &json!(null)).unwrap(), Value::Null);
    }

    #[test]
    fn time_requires_seconds() {
        let ty = typed("time without time zone");
        assert_eq!(
            convert_for_write("t", &ty, &json!("08:15:00")).unwrap(),
            Value::Time(NaiveTime::from_hms_opt(8, 15, 0).unwrap())
        );
        assert!(convert_for_write("t", &ty, &json!("08:15")).is_err());
    }

    #[test]
    fn integer_and_other_pass_through() {
        assert_eq!(
            convert_for_write("i", &typed("integer"), &json!("7")).unwrap(),
            Value::Text("7".into())
        );
        assert_eq!(
            convert_for_write("u", &typed("uuid"), &json!("a-b")).unwrap(),
            Value::Text("a-b".into())
        );
    }
}
