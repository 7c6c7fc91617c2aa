//! Tokenizer, `%ifdef` preprocessor, and declaration-stream producer for the
//! grammar dialect. Everything here is grounded on how the reference
//! tokenizer peeks a `Chars` stream and how its lexer/parser split work.

pub mod error;
pub mod parser;
pub mod pragma;
pub mod preprocess;
pub mod token;

use std::collections::HashSet;

use gramforge_core::declaration::Declaration;

pub use error::SyntaxError;
pub use pragma::Pragma;
pub use preprocess::{IncludeResolver, NoIncludes};

/// Runs the preprocessor then the parser over one source file, producing the
/// declaration stream [`gramforge_core::builder::Builder`] consumes plus the
/// codegen-only pragma list.
#[tracing::instrument(level = "debug", skip(source, defines, includes))]
pub fn compile(
    source: &str,
    defines: &HashSet<String>,
    includes: &dyn IncludeResolver,
) -> Result<(Vec<Declaration>, Vec<Pragma>), SyntaxError> {
    let preprocessed = preprocess::run(source, defines, includes)?;
    parser::parse(&preprocessed)
}
