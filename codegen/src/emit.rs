//! Stage K (Rust half): renders the packed tables, the token/value types,
//! and every rule's rewritten action code through [`crate::template`] into
//! one generated Rust source file.

use std::collections::HashMap;
use std::fmt::Write as _;

use gramforge_core::grammar::Grammar;
use gramforge_core::ids::EOF_SYMBOL;
use gramforge_core::state::NO_OFFSET;
use gramforge_core::PackedTables;
use gramforge_syntax::Pragma;

use crate::error::CodegenError;
use crate::rewrite;
use crate::template;

#[derive(Debug, Clone)]
pub struct EmitConfig {
    pub template_path: Option<std::path::PathBuf>,
    pub suppress_line_directives: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        EmitConfig { template_path: None, suppress_line_directives: false }
    }
}

fn pragma_text<'a>(pragmas: &'a [Pragma], pick: impl Fn(&'a Pragma) -> Option<&'a str>) -> Option<&'a str> {
    pragmas.iter().find_map(pick)
}

fn i32_array(values: impl Iterator<Item = i32>) -> String {
    let items: Vec<String> = values.map(|v| v.to_string()).collect();
    format!("&[{}]", items.join(", "))
}

/// `Token::Eof` already represents symbol index 0 (the end-of-input
/// terminal, §6); `{default}` is a synthetic lookahead never seen by a real
/// token. Neither gets its own enum variant.
fn real_terminals(g: &Grammar) -> impl Iterator<Item = &gramforge_core::symbol::Symbol> {
    g.symbols
        .iter()
        .take(g.nterminal)
        .filter(|sym| sym.id != EOF_SYMBOL && sym.name != "{default}")
}

fn token_enum(g: &Grammar, value_type: &str) -> String {
    let mut out = String::new();
    writeln!(out, "#[derive(Debug, Clone)]").unwrap();
    writeln!(out, "pub enum Token {{").unwrap();
    writeln!(out, "    Eof,").unwrap();
    for sym in real_terminals(g) {
        writeln!(out, "    {}({value_type}),", sym.name).unwrap();
    }
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "impl Token {{").unwrap();
    writeln!(out, "    fn id(&self) -> i32 {{").unwrap();
    writeln!(out, "        match self {{").unwrap();
    writeln!(out, "            Token::Eof => 0,").unwrap();
    for sym in real_terminals(g) {
        writeln!(out, "            Token::{}(_) => {},", sym.name, sym.id.index()).unwrap();
    }
    writeln!(out, "        }}").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "    fn into_minor(self) -> {value_type} {{").unwrap();
    writeln!(out, "        match self {{").unwrap();
    writeln!(out, "            Token::Eof => Default::default(),").unwrap();
    for sym in real_terminals(g) {
        writeln!(out, "            Token::{}(v) => v,", sym.name).unwrap();
    }
    writeln!(out, "        }}").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out, "}}").unwrap();
    out
}

fn rule_actions(g: &Grammar, value_type: &str) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "match rule {{").unwrap();
    for rule in &g.rules {
        let rhs_len = rule.rhs.len();
        let rewritten = rewrite::rewrite(rule)?;
        writeln!(out, "    {} => {{", rule.i_rule.0).unwrap();
        for i in 0..rhs_len {
            writeln!(
                out,
                "        let __yy{} = match &self.value_stack[self.value_stack.len() - {} + {}] {{ YYMinor::Token(v) | YYMinor::Nonterm(v) => v.clone() }};",
                i + 1,
                rhs_len,
                i
            )
            .unwrap();
        }
        for (name, pos) in &rewritten.bindings {
            writeln!(out, "        let {name} = __yy{}.clone();", pos + 1).unwrap();
        }
        let goto_var = rule.lhs_alias.clone().unwrap_or_else(|| "__yygoto".to_string());
        writeln!(out, "        let mut {goto_var}: {value_type} = Default::default();").unwrap();
        if !rewritten.body.trim().is_empty() {
            writeln!(out, "        {{ {} }}", rewritten.body).unwrap();
        }
        writeln!(
            out,
            "        self.state_stack.truncate(self.state_stack.len() - {rhs_len});"
        )
        .unwrap();
        writeln!(
            out,
            "        self.value_stack.truncate(self.value_stack.len() - {rhs_len});"
        )
        .unwrap();
        writeln!(out, "        let __goto = self.find_goto(self.top_state(), {});", rule.lhs.index()).unwrap();
        writeln!(out, "        self.state_stack.push(__goto);").unwrap();
        writeln!(out, "        self.value_stack.push(YYMinor::Nonterm({goto_var}));").unwrap();
        writeln!(out, "        Ok(())").unwrap();
        writeln!(out, "    }}").unwrap();
    }
    writeln!(out, "    _ => Err(ParseError::StackUnderflow),").unwrap();
    writeln!(out, "}}").unwrap();
    Ok(out)
}

/// Render the whole generated Rust parser source for `grammar`/`tables`.
#[tracing::instrument(level = "debug", skip(g, tables, pragmas, config))]
pub fn render(
    g: &Grammar,
    tables: &PackedTables,
    pragmas: &[Pragma],
    config: &EmitConfig,
) -> Result<String, CodegenError> {
    let value_type = pragma_text(pragmas, |p| match p {
        Pragma::TokenType(t) => Some(t.as_str()),
        _ => None,
    })
    .or_else(|| {
        pragma_text(pragmas, |p| match p {
            Pragma::DefaultType(t) => Some(t.as_str()),
            _ => None,
        })
    })
    .unwrap_or("()")
    .to_string();

    let extra_argument = pragma_text(pragmas, |p| match p {
        Pragma::ExtraArgument(t) => Some(t.as_str()),
        _ => None,
    });

    let mut constants = String::new();
    let e = &tables.encoding;
    writeln!(constants, "pub const YY_NSTATE: i32 = {};", g.nxstate).unwrap();
    writeln!(constants, "pub const YY_NRULE: i32 = {};", g.rules.len()).unwrap();
    writeln!(constants, "pub const YY_NTERMINAL: i32 = {};", g.nterminal).unwrap();
    writeln!(constants, "pub const YY_MIN_SHIFT_REDUCE: i32 = {};", e.min_shift_reduce).unwrap();
    writeln!(constants, "pub const YY_MIN_REDUCE: i32 = {};", e.min_reduce).unwrap();
    writeln!(constants, "pub const YY_ERROR_ACTION: i32 = {};", e.err_action).unwrap();
    writeln!(constants, "pub const YY_ACCEPT_ACTION: i32 = {};", e.acc_action).unwrap();
    writeln!(constants, "pub const YY_NO_ACTION: i32 = {};", e.no_action).unwrap();
    writeln!(constants, "const YY_NO_OFFSET: i32 = {};", NO_OFFSET as i32).unwrap();
    writeln!(constants, "static YY_ACTION: &[i32] = {};", i32_array(tables.action.iter().copied())).unwrap();
    writeln!(constants, "static YY_LOOKAHEAD: &[i32] = {};", i32_array(tables.lookahead.iter().copied())).unwrap();
    writeln!(
        constants,
        "static YY_SHIFT_OFST: &[i32] = {};",
        i32_array(g.states[..g.nxstate].iter().map(|s| s.i_tkn_ofst as i32))
    )
    .unwrap();
    writeln!(
        constants,
        "static YY_REDUCE_OFST: &[i32] = {};",
        i32_array(g.states[..g.nxstate].iter().map(|s| s.i_nt_ofst as i32))
    )
    .unwrap();
    let default_codes: Vec<i32> = g.states[..g.nxstate]
        .iter()
        .map(|s| match s.default_reduce {
            Some(r) => e.min_reduce + g.rule(r).i_rule.0 as i32,
            None => e.err_action,
        })
        .collect();
    writeln!(constants, "static YY_DEFAULT: &[i32] = {};", i32_array(default_codes.into_iter())).unwrap();

    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("HEADER", format!("symbols: {}, rules: {}, states: {}", g.nsymbol(), g.rules.len(), g.nxstate));
    vars.insert("CONSTANTS", constants);
    vars.insert("TOKEN_ENUM", token_enum(g, &value_type));
    vars.insert("VALUE_TYPE", value_type.clone());
    vars.insert(
        "EXTRA_ARGUMENT_FIELD",
        extra_argument.map(|t| format!("pub extra: {t},")).unwrap_or_default(),
    );
    vars.insert(
        "EXTRA_ARGUMENT_PARAM",
        pragma_text(pragmas, |p| match p {
            Pragma::ExtraArgument(t) => Some(t.as_str()),
            _ => None,
        })
        .map(|t| format!("extra: {t}"))
        .unwrap_or_default(),
    );
    vars.insert(
        "EXTRA_ARGUMENT_INIT",
        pragma_text(pragmas, |p| match p {
            Pragma::ExtraArgument(_) => Some("extra"),
            _ => None,
        })
        .map(|s| format!("{s},"))
        .unwrap_or_default(),
    );
    vars.insert("RULE_ACTIONS", rule_actions(g, &value_type)?);
    vars.insert("REPORT_HOOKS", String::new());

    let template = template::load(config.template_path.as_deref())?;
    Ok(template::render(&template, &vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramforge_core::declaration::{Assoc, Declaration};
    use gramforge_core::Builder;

    fn rule(lhs: &str, rhs: &[&str]) -> Vec<Declaration> {
        let mut out = vec![Declaration::RuleStart { lhs: lhs.into(), lhs_alias: None }];
        for s in rhs {
            out.push(Declaration::RuleAppend { symbol: (*s).into(), alias: None });
        }
        out.push(Declaration::RuleFinish { action_code: None, explicit_prec: None });
        out
    }

    #[test]
    fn renders_constants_and_a_token_variant_per_terminal() {
        let mut b = Builder::new();
        b.feed(Declaration::PrecedenceBand { assoc: Assoc::Left, terminals: vec!["Plus".into()] });
        b.feed_all(rule("e", &["e", "Plus", "e"]));
        b.feed_all(rule("e", &["Id"]));
        let out = b.finish().unwrap();
        let rendered = render(&out.grammar, &out.tables, &[], &EmitConfig::default()).unwrap();
        assert!(rendered.contains("pub enum Token"));
        assert!(rendered.contains("Plus(()"));
        assert!(rendered.contains("YY_NSTATE"));
        assert!(rendered.contains("fn feed(&mut self"));
    }

    #[test]
    fn extra_argument_pragma_adds_a_struct_field() {
        let mut b = Builder::new();
        b.feed_all(rule("e", &["Id"]));
        let out = b.finish().unwrap();
        let pragmas = vec![Pragma::ExtraArgument("Ctx".to_string())];
        let rendered = render(&out.grammar, &out.tables, &pragmas, &EmitConfig::default()).unwrap();
        assert!(rendered.contains("pub extra: Ctx,"));
    }
}
