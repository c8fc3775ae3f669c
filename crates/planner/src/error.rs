use std::fmt;
use thiserror::Error;

/// Why the safety validator refused a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsafeReason {
    MultipleStatements,
    DangerousKeyword(String),
    UnbalancedParentheses,
    UnterminatedQuote,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsafeReason::MultipleStatements => write!(f, "multiple SQL statements are not allowed"),
            UnsafeReason::DangerousKeyword(kw) => write!(f, "dangerous SQL keyword detected: {kw}"),
            UnsafeReason::UnbalancedParentheses => write!(f, "unbalanced parentheses in SQL"),
            UnsafeReason::UnterminatedQuote => write!(f, "unterminated quote in SQL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The model has no tables to select from.
    #[error("no table defined for model {0}")]
    NoMainTable(String),

    /// A raw-SQL model has no statement text.
    #[error("raw SQL content is empty for model {0}")]
    EmptyRawSql(String),

    /// The join parent links loop back on themselves.
    #[error("join cycle detected at join {0}")]
    JoinCycle(String),

    /// A caller filter used an operator outside the allowed set.
    #[error("unsupported filter operator: {0:?}")]
    UnsupportedFilterOperator(String),

    /// The compiled statement failed the safety checks.
    #[error("unsafe SQL: {reason}")]
    UnsafeSql { reason: UnsafeReason },
}

impl CompileError {
    /// Errors caused by how the model is configured rather than by the caller.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CompileError::NoMainTable(_) | CompileError::EmptyRawSql(_) | CompileError::JoinCycle(_)
        )
    }
}

impl From<UnsafeReason> for CompileError {
    fn from(reason: UnsafeReason) -> Self {
        CompileError::UnsafeSql { reason }
    }
}
