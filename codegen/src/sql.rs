//! `-S`: an accompanying SQL table-dump of the grammar and its tables, for
//! inspecting a build with a generic SQL browser instead of grepping the
//! `.out` report.

use std::fmt::Write as _;

use gramforge_core::grammar::Grammar;
use gramforge_core::PackedTables;

fn sql_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn render(g: &Grammar, tables: &PackedTables) -> String {
    let mut out = String::new();
    writeln!(out, "BEGIN TRANSACTION;").unwrap();

    writeln!(out, "CREATE TABLE symbol(id INTEGER PRIMARY KEY, name TEXT, kind TEXT, is_terminal INTEGER);").unwrap();
    for (i, sym) in g.symbols.iter().enumerate() {
        writeln!(
            out,
            "INSERT INTO symbol VALUES({i}, {}, {}, {});",
            sql_quote(&sym.name),
            sql_quote(&format!("{:?}", sym.kind)),
            i32::from(i < g.nterminal)
        )
        .unwrap();
    }

    writeln!(out, "CREATE TABLE rule(irule INTEGER PRIMARY KEY, lhs INTEGER, rhs_len INTEGER, text TEXT);").unwrap();
    for rule in &g.rules {
        let rhs_text: Vec<&str> = rule.rhs.iter().map(|&s| g.symbol(s).name.as_str()).collect();
        let text = format!("{} ::= {}", g.symbol(rule.lhs).name, rhs_text.join(" "));
        writeln!(out, "INSERT INTO rule VALUES({}, {}, {}, {});", rule.i_rule.0, rule.lhs.index(), rule.rhs.len(), sql_quote(&text)).unwrap();
    }

    writeln!(out, "CREATE TABLE state(id INTEGER PRIMARY KEY, n_tkn_act INTEGER, n_nt_act INTEGER, i_tkn_ofst INTEGER, i_nt_ofst INTEGER, auto_reduce INTEGER);").unwrap();
    for (i, s) in g.states[..g.nxstate].iter().enumerate() {
        writeln!(
            out,
            "INSERT INTO state VALUES({i}, {}, {}, {}, {}, {});",
            s.n_tkn_act,
            s.n_nt_act,
            s.i_tkn_ofst,
            s.i_nt_ofst,
            i32::from(s.auto_reduce)
        )
        .unwrap();
    }

    writeln!(out, "CREATE TABLE yy_action(idx INTEGER PRIMARY KEY, lookahead INTEGER, action INTEGER);").unwrap();
    for (i, (&look, &act)) in tables.lookahead.iter().zip(tables.action.iter()).enumerate() {
        writeln!(out, "INSERT INTO yy_action VALUES({i}, {look}, {act});").unwrap();
    }

    writeln!(out, "COMMIT;").unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramforge_core::declaration::Declaration;
    use gramforge_core::Builder;

    #[test]
    fn dump_defines_one_table_per_entity_kind() {
        let mut b = Builder::new();
        b.feed(Declaration::RuleStart { lhs: "e".into(), lhs_alias: None });
        b.feed(Declaration::RuleAppend { symbol: "Id".into(), alias: None });
        b.feed(Declaration::RuleFinish { action_code: None, explicit_prec: None });
        let out = b.finish().unwrap();
        let dump = render(&out.grammar, &out.tables);
        for table in ["symbol", "rule", "state", "yy_action"] {
            assert!(dump.contains(&format!("CREATE TABLE {table}")));
        }
        assert!(dump.starts_with("BEGIN TRANSACTION;"));
        assert!(dump.trim_end().ends_with("COMMIT;"));
    }
}
