use crate::sql::base::error::DbError;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::core::value::Value;
use rust_decimal::Decimal as RustDecimal;
use std::{error::Error, str::FromStr};
use tokio_postgres::types::{IsNull, Json as PgJson, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// SQL NULL for any parameter type.
#[derive(Debug)]
struct PgNull;

impl ToSql for PgNull {
    fn to_sql(&self, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

fn boxed<T: ToSql + Sync + Send + 'static>(value: T) -> PgParam {
    PgParam(Box::new(value))
}

impl PgParam {
    /// Converts `value` into the Rust type matching the parameter type the
    /// server inferred while preparing the statement.
    ///
    /// Compiled statements bind most arguments as text, so this is where
    /// `"42"` becomes an `int8` or `"2024-01-01"` a `date`.
    pub fn coerce(index: usize, value: &Value, ty: &Type) -> Result<Self, DbError> {
        if value.is_null() {
            return Ok(boxed(PgNull));
        }

        let param = match *ty {
            Type::BOOL => value.as_bool().map(boxed),
            Type::INT2 => value
                .as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(boxed),
            Type::INT4 => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(boxed),
            Type::INT8 => value.as_i64().map(boxed),
            Type::OID => value
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .map(boxed),
            Type::FLOAT4 => value.as_f64().map(|v| boxed(v as f32)),
            Type::FLOAT8 => value.as_f64().map(boxed),
            Type::NUMERIC => value
                .as_string()
                .and_then(|s| RustDecimal::from_str(s.trim()).ok())
                .map(boxed),
            Type::DATE => to_date(value).map(boxed),
            Type::TIMESTAMP => to_naive_datetime(value).map(boxed),
            Type::TIMESTAMPTZ => to_datetime_utc(value).map(boxed),
            Type::UUID => match value {
                Value::Uuid(u) => Some(boxed(*u)),
                other => other
                    .as_string()
                    .and_then(|s| Uuid::parse_str(s.trim()).ok())
                    .map(boxed),
            },
            Type::JSON | Type::JSONB => Some(boxed(PgJson(to_json(value)))),
            Type::BYTEA => match value {
                Value::Bytes(b) => Some(boxed(b.clone())),
                other => other.as_string().map(|s| boxed(s.into_bytes())),
            },
            // Text types, and anything else the server can cast from text.
            _ => value.as_string().map(boxed),
        };

        param.ok_or_else(|| DbError::Coercion {
            index,
            expected: ty.name().to_string(),
            value: value.to_string(),
        })
    }
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Timestamp(ts) => Some(ts.date_naive()),
        other => {
            let text = other.as_string()?;
            let text = text.trim();
            NaiveDate::from_str(text)
                .ok()
                .or_else(|| parse_naive_datetime(text).map(|dt| dt.date()))
        }
    }
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::from_str(text)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn to_naive_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Timestamp(ts) => Some(ts.naive_utc()),
        Value::Date(d) => d.and_hms_opt(0, 0, 0),
        other => {
            let text = other.as_string()?;
            let text = text.trim();
            parse_naive_datetime(text)
                .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc()))
        }
    }
}

fn to_datetime_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        other => {
            let text = other.as_string()?;
            let text = text.trim();
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|| to_naive_datetime(other).map(|dt| dt.and_utc()))
        }
    }
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.clone())),
        other => other.to_json(),
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    /// Binds `values` against the parameter types of a prepared statement.
    pub fn coerce(values: &[Value], types: &[Type]) -> Result<Self, DbError> {
        let params = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let ty = types.get(index).unwrap_or(&Type::TEXT);
                PgParam::coerce(index, value, ty)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { params })
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}
