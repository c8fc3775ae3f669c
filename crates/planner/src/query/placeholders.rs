use crate::query::{
    dialect::Dialect,
    lexer::{Segment, segments},
};

/// Renumbers `?` markers outside literals and quoted identifiers into the
/// dialect's placeholder style, e.g. `$1`, `$2` for PostgreSQL.
pub fn number_placeholders(sql: &str, dialect: &dyn Dialect) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    for segment in segments(sql) {
        match segment {
            Segment::Code(text) => {
                for c in text.chars() {
                    if c == '?' {
                        out.push_str(&dialect.get_placeholder(index));
                        index += 1;
                    } else {
                        out.push(c);
                    }
                }
            }
            other => other.write_to(&mut out),
        }
    }
    out
}
