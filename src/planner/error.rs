use sqlparser::parser::ParserError;
use thiserror::Error;

/// Failures turning SQL text into a plan. Schema lookups that miss are
/// reported as [`DatabaseError`](crate::types::error::DatabaseError) not-found
/// variants instead.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("SQL parse error: {0}")]
    SqlParser(#[from] ParserError),

    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("'{0}' has no stored CREATE statement")]
    MissingDefinition(String),
}
