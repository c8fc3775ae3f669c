//! Heuristic checks applied to every compiled statement before it runs.
//!
//! These are a coarse first line of defense; all caller values are bound as
//! parameters. String literal and quoted identifier contents are masked
//! before any check runs. The text is masked twice, once reading `\` as an
//! escape and once not, and must pass under both readings. A quote left
//! open under either reading is rejected.

use crate::{
    error::UnsafeReason,
    query::lexer::{Escapes, mask_quoted},
};

pub const DENIED_KEYWORDS: [&str; 7] = [
    "DROP", "TRUNCATE", "ALTER", "GRANT", "REVOKE", "SHUTDOWN", "EXEC",
];

pub fn validate(sql: &str) -> Result<(), UnsafeReason> {
    for escapes in [Escapes::Standard, Escapes::Backslash] {
        let masked = mask_quoted(sql, escapes).ok_or(UnsafeReason::UnterminatedQuote)?;

        check_single_statement(&masked)?;
        check_keywords(&masked)?;
        check_parentheses(&masked)?;
    }
    Ok(())
}

fn check_single_statement(sql: &str) -> Result<(), UnsafeReason> {
    let trimmed = sql.trim();
    match trimmed.matches(';').count() {
        0 => Ok(()),
        1 if trimmed.ends_with(';') => Ok(()),
        _ => Err(UnsafeReason::MultipleStatements),
    }
}

fn check_keywords(sql: &str) -> Result<(), UnsafeReason> {
    let normalized: String = sql
        .to_uppercase()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    for kw in DENIED_KEYWORDS {
        if normalized.contains(&format!(" {kw} ")) || normalized.starts_with(&format!("{kw} ")) {
            return Err(UnsafeReason::DangerousKeyword(kw.to_string()));
        }
    }
    Ok(())
}

fn check_parentheses(sql: &str) -> Result<(), UnsafeReason> {
    let open = sql.matches('(').count();
    let close = sql.matches(')').count();
    if open == close {
        Ok(())
    } else {
        Err(UnsafeReason::UnbalancedParentheses)
    }
}
