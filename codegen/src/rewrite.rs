//! Stage J: rewrites `@N` positional references inside a rule's embedded
//! action code into concrete stack-slot locals. Named aliases need no
//! textual rewriting at all — the emitter binds a `let` with the alias's own
//! name, so the action code, spliced in verbatim, already resolves them.

use gramforge_core::rule::Rule;

use crate::error::CodegenError;

/// One rule's action code, ready to splice into a `match iRule { ... }` arm:
/// `bindings` lists `(local name, 0-based RHS position)` pairs the emitter
/// must bind before `body`, and `body` is the action code with every `@N`
/// replaced by `__yyN`.
pub struct RewrittenAction {
    pub bindings: Vec<(String, usize)>,
    pub body: String,
}

pub fn rewrite(rule: &Rule) -> Result<RewrittenAction, CodegenError> {
    let bindings = rule
        .rhs_aliases
        .iter()
        .enumerate()
        .filter_map(|(i, alias)| alias.clone().map(|name| (name, i)))
        .collect();

    let raw = rule.action_code.as_deref().unwrap_or("");
    let body = rewrite_positional_refs(raw, rule.rhs.len())?;
    Ok(RewrittenAction { bindings, body })
}

fn rewrite_positional_refs(code: &str, rhs_len: usize) -> Result<String, CodegenError> {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }
        let mut digits = String::new();
        while let Some(&(_, d)) = chars.peek() {
            if d.is_ascii_digit() {
                digits.push(d);
                chars.next();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            out.push('@');
            continue;
        }
        let n: usize = digits.parse().expect("only ascii digits were collected");
        if n == 0 || n > rhs_len {
            return Err(CodegenError::DanglingActionLabel(n, rhs_len));
        }
        out.push_str(&format!("__yy{n}"));
    }
    Ok(out)
}
