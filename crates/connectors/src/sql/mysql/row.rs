use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use model::{
    core::value::Value,
    records::row::{FieldValue, Record},
};
use mysql_async::{Row, Value as MySqlValue, consts::ColumnType};
use tracing::warn;

/// Decodes a MySQL row. Byte payloads become text unless the column is
/// numeric-decimal or JSON.
pub fn to_record(row: &Row) -> Record {
    let fields = row
        .columns_ref()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let raw = row.as_ref(idx).cloned().unwrap_or(MySqlValue::NULL);
            FieldValue {
                name: column.name_str().into_owned(),
                value: decode(raw, column.column_type()),
            }
        })
        .collect();
    Record::new(fields)
}

fn decode(raw: MySqlValue, column_type: ColumnType) -> Value {
    match raw {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(v) => Value::Int(v),
        MySqlValue::UInt(v) => Value::Uint(v),
        MySqlValue::Float(v) => Value::Float(f64::from(v)),
        MySqlValue::Double(v) => Value::Float(v),
        MySqlValue::Bytes(bytes) => decode_bytes(bytes, column_type),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let Some(date) = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into()) else {
                warn!(year, month, day, "Invalid MySQL date, returning NULL");
                return Value::Null;
            };
            if matches!(
                column_type,
                ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
            ) {
                return Value::Date(date);
            }
            NaiveTime::from_hms_micro_opt(hour.into(), minute.into(), second.into(), micros)
                .map(|time| Value::Timestamp(NaiveDateTime::new(date, time).and_utc()))
                .unwrap_or(Value::Date(date))
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Value::String(text)
        }
    }
}

fn decode_bytes(bytes: Vec<u8>, column_type: ColumnType) -> Value {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    match column_type {
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
            Value::decimal_from_str(&text).unwrap_or(Value::String(text))
        }
        ColumnType::MYSQL_TYPE_JSON => serde_json::from_str(&text)
            .map(Value::Json)
            .unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}
