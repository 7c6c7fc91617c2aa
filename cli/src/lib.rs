//! The library half of the CLI: everything `main` does except parsing
//! `std::env::args` and calling `std::process::exit`, so integration tests
//! can drive a full run in-process (§6e testing note).

pub mod config;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gramforge_codegen::{diagnostics, emit, report, sql, EmitConfig, ReportOptions};
use gramforge_core::{BuildOptions, Builder, Diagnostic};
use gramforge_syntax::preprocess::NoIncludes;

pub use config::Config;

/// Everything a run produced, for a test (or `main`) to inspect.
pub struct RunOutcome {
    pub generated_source: Option<String>,
    pub report: Option<String>,
    pub sql_dump: Option<String>,
    pub preprocessed: Option<String>,
    pub error_count: usize,
    pub conflict_count: usize,
}

impl RunOutcome {
    /// §6d: exit code 0 on success, 1 if any errors or unresolved conflicts.
    pub fn exit_code(&self) -> i32 {
        if self.error_count == 0 && self.conflict_count == 0 {
            0
        } else {
            1
        }
    }
}

#[tracing::instrument(level = "debug", skip(config))]
pub fn run(config: &Config) -> Result<RunOutcome> {
    let source = fs::read_to_string(&config.grammar)
        .with_context(|| format!("reading grammar file {}", config.grammar.display()))?;

    let defines: HashSet<String> = config
        .defines
        .iter()
        .map(|d| d.split('=').next().unwrap_or(d).to_string())
        .collect();

    let preprocessed = gramforge_syntax::preprocess::run(&source, &defines, &NoIncludes)
        .context("preprocessing grammar source")?;

    if config.print_preprocessed {
        return Ok(RunOutcome {
            generated_source: None,
            report: None,
            sql_dump: None,
            preprocessed: Some(preprocessed),
            error_count: 0,
            conflict_count: 0,
        });
    }

    let (decls, pragmas) = gramforge_syntax::parser::parse(&preprocessed).context("parsing grammar declarations")?;

    let mut builder = Builder::new();
    builder.feed_all(decls);

    let options = BuildOptions { compress: !config.no_compress, resort: !config.no_resort };
    let output = builder.finish_with(options).context("building parser tables")?;

    let mut all_diagnostics = output.diagnostics;
    all_diagnostics.extend(diagnostics::unused_destructors(&output.grammar, &pragmas));

    let conflict_count = all_diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::ShiftReduceConflict { .. } | Diagnostic::ReduceReduceConflict { .. }))
        .count();
    let error_count = all_diagnostics.len() - conflict_count;

    let report_text = if config.quiet_report || config.print_grammar_only {
        None
    } else {
        let opts = ReportOptions {
            basis_only: config.basis_only,
            show_resolved_conflicts: config.show_resolved_conflicts,
            statistics: config.statistics,
        };
        Some(report::render(&output.grammar, &all_diagnostics, &opts))
    };

    if config.print_grammar_only {
        return Ok(RunOutcome {
            generated_source: None,
            report: report_text,
            sql_dump: None,
            preprocessed: Some(preprocessed),
            error_count,
            conflict_count,
        });
    }

    let emit_config = EmitConfig {
        template_path: config.template_path.clone(),
        suppress_line_directives: config.no_line_directives,
    };
    let generated = emit::render(&output.grammar, &output.tables, &pragmas, &emit_config).context("emitting generated parser source")?;

    let sql_dump = if config.sql_dump { Some(sql::render(&output.grammar, &output.tables)) } else { None };

    Ok(RunOutcome {
        generated_source: Some(generated),
        report: report_text,
        sql_dump,
        preprocessed: Some(preprocessed),
        error_count,
        conflict_count,
    })
}

/// Resolve `-d DIR` against the grammar file's own directory when absent.
pub fn output_dir(config: &Config) -> PathBuf {
    config
        .out_dir
        .clone()
        .or_else(|| config.grammar.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn stem(config: &Config) -> String {
    config
        .grammar
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grammar".to_string())
}
