//! §6d: the CLI surface, pinned one-to-one onto a `clap` derive struct.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(name = "gramforge", version, about = "LEMON-style parser table generator")]
pub struct Config {
    /// Grammar source file.
    pub grammar: PathBuf,

    /// `-b`: print only basis configurations in the report.
    #[arg(short = 'b')]
    pub basis_only: bool,

    /// `-c`: disable default-action compression.
    #[arg(short = 'c')]
    pub no_compress: bool,

    /// `-d DIR`: output directory (defaults to the grammar file's directory).
    #[arg(short = 'd')]
    pub out_dir: Option<PathBuf>,

    /// `-D NAME`: define a preprocessor macro. May be repeated.
    #[arg(short = 'D')]
    pub defines: Vec<String>,

    /// `-E`: print preprocessed input and exit.
    #[arg(short = 'E')]
    pub print_preprocessed: bool,

    /// `-g`: print grammar only (no table construction).
    #[arg(short = 'g')]
    pub print_grammar_only: bool,

    /// `-l`: suppress `#line`-style directives in generated output.
    #[arg(short = 'l')]
    pub no_line_directives: bool,

    /// `-p`: show precedence-resolved conflicts in the report.
    #[arg(short = 'p')]
    pub show_resolved_conflicts: bool,

    /// `-q`: suppress the `.out` report entirely.
    #[arg(short = 'q')]
    pub quiet_report: bool,

    /// `-r`: disable state resorting (stage H becomes a no-op ordering).
    #[arg(short = 'r')]
    pub no_resort: bool,

    /// `-s`: print statistics in the report.
    #[arg(short = 's')]
    pub statistics: bool,

    /// `-S`: also emit a SQL table-dump alongside the generated parser.
    #[arg(short = 'S')]
    pub sql_dump: bool,

    /// `-x`: print version and exit.
    #[arg(short = 'x')]
    pub print_version: bool,

    /// `-T PATH`: override the template used by the emitter.
    #[arg(short = 'T')]
    pub template_path: Option<PathBuf>,

    /// Raise the `tracing` filter level; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl Config {
    pub fn filter_level(&self) -> tracing::Level {
        match self.verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
