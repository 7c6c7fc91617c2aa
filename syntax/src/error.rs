use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("{path}:{line}: {message}")]
    Located { path: String, line: u32, message: String },

    #[error("unterminated action code block starting at line {0}")]
    UnterminatedActionCode(u32),

    #[error("unterminated string literal at line {0}")]
    UnterminatedString(u32),

    #[error("unbalanced %ifdef/%ifndef: {0}")]
    UnbalancedConditional(String),

    #[error("include resolution failed for {path}: {reason}")]
    IncludeFailed { path: String, reason: String },

    #[error("unexpected token at line {line}: {found}")]
    UnexpectedToken { line: u32, found: String },
}
