use model::core::value::Value as CoreValue;
use rusqlite::{
    Row,
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
};

/// Bridges engine values to SQLite's storage classes.
#[derive(Debug)]
pub struct Value<'a>(pub &'a CoreValue);

impl Value<'_> {
    /// Reads column `index`. Blobs are returned as text.
    pub fn from_sql(row: &Row, index: usize) -> rusqlite::Result<CoreValue> {
        let value = match row.get_ref(index)? {
            ValueRef::Null => CoreValue::Null,
            ValueRef::Integer(v) => CoreValue::Int(v),
            ValueRef::Real(v) => CoreValue::Float(v),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                CoreValue::String(String::from_utf8_lossy(bytes).into_owned())
            }
        };
        Ok(value)
    }
}

impl ToSql for Value<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self.0 {
            CoreValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            CoreValue::Int(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            CoreValue::Uint(v) => match i64::try_from(*v) {
                Ok(v) => ToSqlOutput::Owned(SqlValue::Integer(v)),
                Err(_) => ToSqlOutput::Owned(SqlValue::Text(v.to_string())),
            },
            CoreValue::Float(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            CoreValue::Boolean(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            CoreValue::String(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            CoreValue::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(&v[..])),
            other => ToSqlOutput::Owned(SqlValue::Text(other.as_string().unwrap_or_default())),
        };
        Ok(output)
    }
}
