//! Directives that configure the emitted parser's surface but carry no
//! table-construction meaning, so they never reach [`gramforge_core`]. The
//! codegen crate consumes these directly.

#[derive(Debug, Clone)]
pub enum Pragma {
    /// `%extra_argument TYPE.`
    ExtraArgument(String),
    /// `%token_type TYPE.`
    TokenType(String),
    /// `%default_type TYPE.`
    DefaultType(String),
    /// `%syntax_error { CODE }`
    SyntaxError(String),
    /// `%parse_failure { CODE }`
    ParseFailure(String),
    /// `%parse_accept { CODE }`
    ParseAccept(String),
    /// `%destructor SYMBOL { CODE }`
    Destructor { symbol: String, code: String },
}
