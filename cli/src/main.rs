use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as _;
use gramforge_cli::{output_dir, run, stem, Config};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = Config::parse();

    if config.print_version {
        println!("gramforge {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.filter_level()).into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match execute(&config) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn execute(config: &Config) -> anyhow::Result<ExitCode> {
    let outcome = run(config)?;

    if let Some(preprocessed) = &outcome.preprocessed {
        if config.print_preprocessed {
            print!("{preprocessed}");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let dir = output_dir(config);
    fs::create_dir_all(&dir).with_context(|| format!("creating output directory {}", dir.display()))?;
    let stem = stem(config);

    if let Some(source) = &outcome.generated_source {
        let path = dir.join(format!("{stem}.rs"));
        fs::write(&path, source).with_context(|| format!("writing generated parser to {}", path.display()))?;
    }

    if let Some(dump) = &outcome.sql_dump {
        let path = dir.join(format!("{stem}.sql"));
        fs::write(&path, dump).with_context(|| format!("writing SQL dump to {}", path.display()))?;
    }

    if let Some(report) = &outcome.report {
        let path = dir.join(format!("{stem}.out"));
        fs::write(&path, report).with_context(|| format!("writing report to {}", path.display()))?;
        tracing::debug!(bytes = report.len(), "wrote .out report");
    }

    if outcome.conflict_count > 0 {
        tracing::warn!(conflicts = outcome.conflict_count, "unresolved conflicts remain");
    }
    if outcome.error_count > 0 {
        tracing::error!(errors = outcome.error_count, "grammar had errors");
    }

    Ok(if outcome.exit_code() == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
