use crate::error::CliError;
use engine_core::engine::CompiledQuery;
use serde::Serialize;
use serde_json::{Value as Json, json};

pub fn compiled_json(query: &CompiledQuery) -> Json {
    json!({
        "sql": query.sql,
        "args": query.args.iter().map(|arg| arg.to_json()).collect::<Vec<_>>(),
        "conn_id": query.conn_id,
    })
}

/// Pretty JSON to `path`, or stdout when no path is given.
pub async fn emit<T: Serialize + ?Sized>(value: &T, path: Option<&str>) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => tokio::fs::write(path, rendered).await?,
        None => println!("{rendered}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;

    #[test]
    fn test_compiled_json_shape() {
        let query = CompiledQuery {
            sql: "SELECT * FROM `users` WHERE `users`.`id` = ?".into(),
            args: vec![Value::Int(7), Value::from("x")],
            conn_id: "main".into(),
        };
        assert_eq!(
            compiled_json(&query),
            json!({
                "sql": "SELECT * FROM `users` WHERE `users`.`id` = ?",
                "args": [7, "x"],
                "conn_id": "main",
            })
        );
    }

    #[tokio::test]
    async fn test_emit_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        emit(&json!({"total": 3}), path.to_str()).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<Json>(&written).unwrap(), json!({"total": 3}));
    }
}
