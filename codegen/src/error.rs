use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("action code references @{0}, but the rule has only {1} right-hand side symbols")]
    DanglingActionLabel(usize, usize),

    #[error("template file could not be read: {0}")]
    Io(#[from] std::io::Error),
}
