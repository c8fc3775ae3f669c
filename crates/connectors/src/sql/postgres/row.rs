use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use model::{
    core::value::Value,
    records::row::{FieldValue, Record},
};
use rust_decimal::Decimal as RustDecimal;
use std::str::FromStr;
use tokio_postgres::{
    Row,
    types::{FromSql, Json as PgJson, Type},
};
use tracing::warn;
use uuid::Uuid;

pub fn to_record(row: &Row) -> Record {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| FieldValue {
            name: column.name().to_string(),
            value: decode(row, idx, column.type_()),
        })
        .collect();
    Record::new(fields)
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Option<T> {
    match row.try_get::<_, Option<T>>(idx) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, column = idx, "Failed to decode Postgres value");
            None
        }
    }
}

fn decode(row: &Row, idx: usize, ty: &Type) -> Value {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx).map(Value::Boolean),
        Type::INT2 => get::<i16>(row, idx).map(|v| Value::Int(v.into())),
        Type::INT4 => get::<i32>(row, idx).map(|v| Value::Int(v.into())),
        Type::INT8 => get::<i64>(row, idx).map(Value::Int),
        Type::OID => get::<u32>(row, idx).map(|v| Value::Uint(v.into())),
        Type::FLOAT4 => get::<f32>(row, idx).map(|v| Value::Float(v.into())),
        Type::FLOAT8 => get::<f64>(row, idx).map(Value::Float),
        Type::NUMERIC => get::<RustDecimal>(row, idx)
            .and_then(|d| BigDecimal::from_str(&d.to_string()).ok())
            .map(Value::Decimal),
        Type::JSON | Type::JSONB => {
            get::<PgJson<serde_json::Value>>(row, idx).map(|json| Value::Json(json.0))
        }
        Type::UUID => get::<Uuid>(row, idx).map(Value::Uuid),
        Type::DATE => get::<NaiveDate>(row, idx).map(Value::Date),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx).map(|v| Value::Timestamp(v.and_utc())),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx).map(Value::Timestamp),
        Type::TIME => get::<NaiveTime>(row, idx).map(|v| Value::String(v.to_string())),
        Type::BYTEA => get::<Vec<u8>>(row, idx)
            .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, idx).map(Value::String)
        }
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(value) => value.map(Value::String),
            Err(_) => {
                warn!(column = idx, pg_type = %ty, "Unsupported Postgres type, returning NULL");
                None
            }
        },
    };
    value.unwrap_or(Value::Null)
}
