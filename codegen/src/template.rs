//! The "minimal template engine" §4.K/Non-goals call for: `{{KEY}}`
//! substitution only, no control flow, no nested templates. Everything that
//! would otherwise be a loop or conditional in the template is instead
//! rendered into a plain string by [`crate::emit`] before substitution.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::CodegenError;

pub const DEFAULT_TEMPLATE: &str = include_str!("templates/parser.rs.tmpl");

pub fn load(path: Option<&Path>) -> Result<String, CodegenError> {
    match path {
        Some(p) => Ok(fs::read_to_string(p)?),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        rest = &rest[start + 2..];
        let end = rest.find("}}").unwrap_or(rest.len());
        let key = rest[..end].trim();
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(""), // an unknown placeholder renders empty rather than panicking
        }
        rest = if end < rest.len() { &rest[end + 2..] } else { "" };
    }
    out.push_str(rest);
    out
}
