//! §6e's "owned-String-in/owned-String-out" preprocessor pass: resolves
//! `%ifdef` / `%ifndef` / `%else` / `%endif` against a symbol set and expands
//! `%include "path"`.
//!
//! Disabled regions and directive lines are blanked rather than removed, so
//! every line number in the output still refers to the same source line —
//! diagnostics built later can keep citing line numbers from the original
//! file.

use std::collections::HashSet;

use crate::error::SyntaxError;

/// Supplies the text behind `%include "path"`. The CLI wires this to the
/// filesystem; tests and other embedders can supply an in-memory map.
pub trait IncludeResolver {
    fn resolve(&self, path: &str) -> Result<String, SyntaxError>;
}

/// An `IncludeResolver` that always fails — the default when a caller has no
/// notion of "other files" to pull in.
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&self, path: &str) -> Result<String, SyntaxError> {
        Err(SyntaxError::IncludeFailed {
            path: path.to_string(),
            reason: "this context does not support %include".to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    /// Currently emitting lines.
    Active,
    /// Condition failed, and no earlier branch at this level was active.
    Inactive,
    /// An earlier branch at this level already fired; later `%else` must
    /// not re-activate.
    Spent,
}

#[tracing::instrument(level = "debug", skip(source, defines, includes))]
pub fn run(source: &str, defines: &HashSet<String>, includes: &dyn IncludeResolver) -> Result<String, SyntaxError> {
    let mut stack: Vec<Branch> = Vec::new();
    let mut out = String::with_capacity(source.len());

    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no as u32 + 1;
        let trimmed = line.trim_start();
        let currently_active = stack.iter().all(|b| *b == Branch::Active);

        if let Some(rest) = trimmed.strip_prefix("%ifdef") {
            let name = rest.trim();
            stack.push(if defines.contains(name) { Branch::Active } else { Branch::Inactive });
            out.push('\n');
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("%ifndef") {
            let name = rest.trim();
            stack.push(if !defines.contains(name) { Branch::Active } else { Branch::Inactive });
            out.push('\n');
            continue;
        }
        if trimmed.starts_with("%else") {
            let top = stack
                .last_mut()
                .ok_or_else(|| SyntaxError::UnbalancedConditional(format!("%else with no open %ifdef at line {line_no}")))?;
            *top = match *top {
                Branch::Active => Branch::Spent,
                Branch::Inactive => Branch::Active,
                Branch::Spent => Branch::Spent,
            };
            out.push('\n');
            continue;
        }
        if trimmed.starts_with("%endif") {
            if stack.pop().is_none() {
                return Err(SyntaxError::UnbalancedConditional(format!("%endif with no open %ifdef at line {line_no}")));
            }
            out.push('\n');
            continue;
        }

        if !currently_active {
            out.push('\n');
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("%include") {
            let path = rest.trim().trim_matches('"');
            let included = includes.resolve(path)?;
            out.push_str(&included);
            if !included.ends_with('\n') {
                out.push('\n');
            }
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    if !stack.is_empty() {
        return Err(SyntaxError::UnbalancedConditional(format!(
            "{} unterminated %ifdef/%ifndef block(s)",
            stack.len()
        )));
    }

    Ok(out)
}
