//! Binds `:name` placeholders in stored SQL text.
//!
//! The text is scanned left to right. A placeholder whose name is present in
//! the params becomes a bound argument, in the order it appears; unknown
//! names are left untouched. `::` casts and quoted identifiers are never
//! placeholders. Placeholders inside string literals are bound by splitting
//! the literal and concatenating the pieces.

use model::core::params::Params;

use crate::{
    error::CompileError,
    query::{
        lexer::{Segment, segments},
        renderer::{Render, Renderer},
    },
};

pub struct RawStatement<'a> {
    pub content: &'a str,
    pub params: &'a Params,
}

impl Render for RawStatement<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        if self.params.is_empty() {
            r.sql.push_str(self.content);
            return Ok(());
        }

        for segment in segments(self.content) {
            match segment {
                Segment::Code(text) => bind_code(r, text, self.params),
                Segment::Literal {
                    body,
                    terminated: true,
                } => bind_literal(r, body, self.params),
                other => other.write_to(&mut r.sql),
            }
        }
        Ok(())
    }
}

/// The placeholder name following the `:` at byte `colon`.
fn placeholder_name(text: &str, colon: usize) -> Option<&str> {
    let rest = &text[colon + 1..];
    let mut end = 0;
    for (i, c) in rest.char_indices() {
        let valid = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        if !valid {
            break;
        }
        end = i + c.len_utf8();
    }
    (end > 0).then(|| &rest[..end])
}

/// Byte ranges of bindable placeholders in `text`, with their names.
fn find_placeholders<'t>(text: &'t str, params: &Params) -> Vec<(usize, usize, &'t str)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b':' {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b':') {
            i += 2;
            continue;
        }
        match placeholder_name(text, i) {
            Some(name) if params.contains(name) => {
                let end = i + 1 + name.len();
                found.push((i, end, name));
                i = end;
            }
            _ => i += 1,
        }
    }
    found
}

fn bind_code(r: &mut Renderer, text: &str, params: &Params) {
    let mut last = 0;
    for (start, end, name) in find_placeholders(text, params) {
        r.sql.push_str(&text[last..start]);
        if let Some(value) = params.get(name) {
            r.add_param(value.to_value());
        }
        last = end;
    }
    r.sql.push_str(&text[last..]);
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn bind_literal(r: &mut Renderer, body: &str, params: &Params) {
    let content = body.replace("''", "'");
    let found = find_placeholders(&content, params);
    if found.is_empty() {
        Segment::Literal {
            body,
            terminated: true,
        }
        .write_to(&mut r.sql);
        return;
    }

    let mut parts = Vec::with_capacity(found.len() * 2 + 1);
    let mut last = 0;
    for (start, end, name) in found {
        if start > last {
            parts.push(quote_literal(&content[last..start]));
        }
        if let Some(value) = params.get(name) {
            parts.push(r.bind(value.to_value()));
        }
        last = end;
    }
    if last < content.len() {
        parts.push(quote_literal(&content[last..]));
    }

    let dialect = r.dialect;
    r.sql.push_str(&dialect.concat(&parts));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::dialect::{MySql, Postgres, Sqlite};
    use model::core::value::Value;

    fn bind(sql: &str, params: &Params) -> (String, Vec<Value>) {
        let mut r = Renderer::new(&MySql);
        RawStatement {
            content: sql,
            params,
        }
        .render(&mut r)
        .unwrap();
        r.finish()
    }

    #[test]
    fn test_named_placeholders_in_text_order() {
        let params = Params::new()
            .with("status", "active")
            .with("start_date", "2024-01-01");
        let (sql, args) = bind(
            "SELECT * FROM t WHERE status = :status AND created >= :start_date",
            &params,
        );
        assert_eq!(sql, "SELECT * FROM t WHERE status = ? AND created >= ?");
        assert_eq!(
            args,
            vec![Value::String("active".into()), Value::String("2024-01-01".into())]
        );
    }

    #[test]
    fn test_no_params_returns_text_unchanged() {
        let sql = "SELECT * FROM t WHERE a = :a";
        assert_eq!(bind(sql, &Params::new()), (sql.to_string(), vec![]));
    }

    #[test]
    fn test_repeated_and_unknown_names() {
        let params = Params::new().with("id", 7);
        let (sql, args) = bind("SELECT :id, :other, :id", &params);
        assert_eq!(sql, "SELECT ?, :other, ?");
        assert_eq!(args, vec![Value::Int(7), Value::Int(7)]);
    }

    #[test]
    fn test_casts_and_identifiers_untouched() {
        let params = Params::new().with("text", "x").with("col", "y");
        let (sql, args) = bind(r#"SELECT id::text, ":col" FROM t WHERE a = :text"#, &params);
        assert_eq!(sql, r#"SELECT id::text, ":col" FROM t WHERE a = ?"#);
        assert_eq!(args, vec![Value::String("x".into())]);
    }

    #[test]
    fn test_placeholder_inside_literal() {
        let params = Params::new().with("kw", "rust");
        let (sql, args) = bind("SELECT * FROM t WHERE name LIKE '%:kw%'", &params);
        assert_eq!(sql, "SELECT * FROM t WHERE name LIKE CONCAT('%', ?, '%')");
        assert_eq!(args, vec![Value::String("rust".into())]);

        let mut r = Renderer::new(&Postgres);
        RawStatement {
            content: "SELECT 'It''s :kw'",
            params: &params,
        }
        .render(&mut r)
        .unwrap();
        assert_eq!(r.finish().0, "SELECT ('It''s ' || ?)");
    }

    #[test]
    fn test_literal_without_bindable_names_is_kept() {
        let params = Params::new().with("kw", "rust");
        let mut r = Renderer::new(&Sqlite);
        RawStatement {
            content: "SELECT 'It''s 10:30', :kw",
            params: &params,
        }
        .render(&mut r)
        .unwrap();
        assert_eq!(r.finish().0, "SELECT 'It''s 10:30', ?");
    }
}
