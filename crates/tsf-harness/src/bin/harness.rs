//! CLI entrypoint for the tsf verification harness.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tsf_core::{Arg, FormatConfig, Formatter};
use tsf_harness::fixtures::EscapeMode;
use tsf_harness::runner::escape_context;
use tsf_harness::structured_log::{ArtifactIndex, LogEmitter, LogLevel, now_utc};
use tsf_harness::{ArgSpec, FixtureSet, TestRunner, VerificationReport, VerificationSummary};

/// Verification tooling for tsf.
#[derive(Debug, Parser)]
#[command(name = "tsf-harness")]
#[command(about = "Render and verify tsf format strings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render one format string to stdout.
    Render {
        /// Format string.
        #[arg(long)]
        format: String,
        /// Argument as `kind:value` (kinds: i32 u32 i64 u64 f64 str wstr ptr null).
        #[arg(long = "arg")]
        args: Vec<String>,
        /// Stack bytes tried before the first heap allocation.
        #[arg(long)]
        stack_capacity: Option<usize>,
        /// Per-directive growth ceiling in bytes.
        #[arg(long)]
        growth_ceiling: Option<usize>,
        /// Enable SQL quoting for `%q` and `%Q`.
        #[arg(long)]
        sql: bool,
    },
    /// Verify the engine against fixture files.
    Verify {
        /// Directory containing fixture JSON files.
        #[arg(long)]
        fixture: PathBuf,
        /// Output report path (markdown); a JSON sibling is written too.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            format,
            args,
            stack_capacity,
            growth_ceiling,
            sql,
        } => {
            let specs = ArgSpec::parse_all(args.as_slice())?;
            let args: Vec<Arg<'_>> = specs.iter().map(ArgSpec::as_arg).collect();

            let mut config = FormatConfig::from_env();
            if let Some(n) = stack_capacity {
                config = config.with_stack_capacity(n);
            }
            if let Some(n) = growth_ceiling {
                config = config.with_growth_ceiling(n);
            }
            let escapes = escape_context(if sql { EscapeMode::Sql } else { EscapeMode::None });
            let formatter = Formatter::new().with_escapes(escapes).with_config(config);

            let mut stdout = std::io::stdout().lock();
            formatter.print(&mut stdout, &format, &args)?;
            writeln!(stdout)?;
        }
        Command::Verify {
            fixture,
            report,
            log,
        } => {
            eprintln!("Verifying against fixtures in {}", fixture.display());
            let fixture_sets = FixtureSet::load_dir(&fixture)?;
            let runner = TestRunner::new("fixture-verify").with_config(FormatConfig::from_env());

            let mut results = Vec::new();
            match &log {
                Some(log_path) => {
                    let mut emitter = LogEmitter::to_file(log_path, "verify")?;
                    emitter.emit(LogLevel::Info, "verify_start")?;
                    for set in &fixture_sets {
                        results.extend(runner.run_logged(set, &mut emitter)?);
                    }
                    emitter.emit(LogLevel::Info, "verify_end")?;
                    emitter.flush()?;
                    eprintln!("Wrote structured log to {}", log_path.display());
                }
                None => {
                    for set in &fixture_sets {
                        results.extend(runner.run(set));
                    }
                }
            }

            let summary = VerificationSummary::from_results(results);
            let report_doc = VerificationReport {
                title: String::from("tsf Verification Report"),
                families: fixture_sets.iter().map(|s| s.family.clone()).collect(),
                timestamp: now_utc(),
                summary,
            };

            eprintln!(
                "Verification complete: total={}, passed={}, failed={}",
                report_doc.summary.total, report_doc.summary.passed, report_doc.summary.failed
            );
            for failure in report_doc.summary.failures() {
                eprintln!(
                    "FAIL {}: expected {:?}, got {:?}",
                    failure.case_name, failure.expected, failure.actual
                );
            }

            if let Some(report_path) = report {
                eprintln!("Writing report to {}", report_path.display());
                let markdown = report_doc.to_markdown();
                std::fs::write(&report_path, &markdown)?;
                let json_path = report_path.with_extension("json");
                let json = report_doc.to_json();
                std::fs::write(&json_path, &json)?;

                let mut index = ArtifactIndex::new("verify");
                let report_ref = report_path.display().to_string();
                index.add(report_ref, "report_markdown", markdown.as_bytes());
                index.add(json_path.display().to_string(), "report_json", json.as_bytes());
                let index_path = report_path.with_extension("artifacts.json");
                std::fs::write(&index_path, index.to_json()?)?;
                eprintln!("Wrote artifact index to {}", index_path.display());
            }

            if !report_doc.summary.all_passed() {
                return Err("Fixture verification failed".into());
            }
        }
    }

    Ok(())
}
