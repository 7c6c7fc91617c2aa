//! Fatal build errors (§4.L, "Build errors"). Non-fatal diagnostics are
//! accumulated separately; see [`crate::diagnostic::Diagnostic`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no rules were parsed")]
    NoRules,

    #[error("start symbol `{0}` was never defined")]
    StartSymbolNotFound(String),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}
