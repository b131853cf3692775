#![warn(missing_docs)]
//! wasmbench CLI Library
//!
//! Command-line front end for the harness. Running the binary with no
//! arguments loads `demos/wasm/fib.wasm` and `demos/wasm/fib_opt.wasm`,
//! calls `fib(30)` on each, calls the Rust reference, and prints one line
//! per candidate:
//!
//! ```text
//! Unoptimized fib(30) = 832040 | Time: 9.87 ms
//! Optimized fib(30) = 832040 | Time: 4.12 ms
//! Reference fib(30) = 832040 | Time: 3.05 ms
//! ```
//!
//! Everything the binary does goes through [`run_with_cli`], which takes the
//! parsed arguments and an output sink so the whole pipeline can be driven
//! from tests.

mod config;
mod plan;
mod references;
mod reporter;

pub use config::*;
pub use plan::{Candidate, CandidateSource, build_plan, resolve_candidate};
pub use references::{available as available_references, fib, lookup as lookup_reference};
pub use reporter::ComparisonReporter;

use anyhow::Context;
use clap::{Parser, Subcommand};
use regex::Regex;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wasmbench_core::{BinarySource, ModuleLoader, Value};
use wasmbench_report::format_summary;

/// wasmbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "wasmbench")]
#[command(
    author,
    version,
    about = "wasmbench - time WebAssembly exports against a Rust reference"
)]
pub struct Cli {
    /// Optional subcommand; defaults to Compare
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: discover wasmbench.toml upwards from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory module paths are resolved against
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Export to invoke
    #[arg(long, global = true)]
    pub export: Option<String>,

    /// Argument passed to the export (repeatable): 30, 30i64, 1.5, 1.5f32
    #[arg(long = "arg", global = true, allow_negative_numbers = true)]
    pub args: Vec<Value>,

    /// Only measure candidates whose label matches this regex
    #[arg(long, global = true)]
    pub only: Option<String>,

    /// Print a speedup table after the report lines
    #[arg(long, global = true)]
    pub summary: bool,

    /// Append cycle counts to each line
    #[arg(long, global = true)]
    pub cycles: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure every configured candidate in order (default)
    Compare,
    /// Load one module and invoke one export once
    Run {
        /// Module file (.wasm or .wat)
        path: PathBuf,
        /// Label for the report line (default: file stem)
        #[arg(long)]
        label: Option<String>,
    },
    /// List the function exports of a module with their signatures
    Exports {
        /// Module file (.wasm or .wat)
        path: PathBuf,
    },
    /// Show the resolved comparison plan without executing it
    List,
    /// Write a default wasmbench.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the wasmbench CLI with arguments from the process.
///
/// Logs go to stderr; report lines go to stdout.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let stdout = std::io::stdout();
    runtime.block_on(run_with_cli(cli, stdout.lock()))
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "wasmbench=debug"
    } else {
        "wasmbench=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the wasmbench CLI with pre-parsed arguments, writing report output to `out`.
pub async fn run_with_cli<W: Write>(cli: Cli, mut out: W) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        None | Some(Commands::Compare) => run_comparison(&cli, &config, out).await,
        Some(Commands::Run { ref path, ref label }) => {
            let source = BinarySource::new(path);
            let label = label.clone().unwrap_or_else(|| source.stem());
            let loader = ModuleLoader::new(&config.runtime.engine_settings())?;
            let mut reporter = ComparisonReporter::new(loader, out)
                .show_cycles(config.output.show_cycles)
                .with_progress(std::io::stderr().is_terminal())
                .pin_cpu(config.runtime.pin_cpu);
            reporter
                .run_single(&label, &source, &config.scenario.export, &config.args()?)
                .await?;
            Ok(())
        }
        Some(Commands::Exports { ref path }) => {
            let loader = ModuleLoader::new(&config.runtime.engine_settings())?;
            let module = loader.compile(&BinarySource::new(path)).await?;
            writeln!(out, "{}:", path.display())?;
            for (name, signature) in module.function_exports() {
                match signature {
                    Ok(sig) => writeln!(out, "  {name} {sig}")?,
                    Err(e) => writeln!(out, "  {name} (unsupported: {e})")?,
                }
            }
            Ok(())
        }
        Some(Commands::List) => list_plan(&cli, &config, out),
        Some(Commands::Init { force }) => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(&path, WasmbenchConfig::default_toml())
                .with_context(|| format!("writing {}", path.display()))?;
            writeln!(out, "Wrote {}", path.display())?;
            Ok(())
        }
    }
}

/// Build the effective configuration: wasmbench.toml (explicit or
/// discovered) → CLI overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<WasmbenchConfig> {
    let mut config = match &cli.config {
        Some(path) if !matches!(cli.command, Some(Commands::Init { .. })) => {
            WasmbenchConfig::load(path)?
        }
        Some(_) => WasmbenchConfig::default(),
        None => WasmbenchConfig::discover()
            .transpose()?
            .unwrap_or_default(),
    };

    if let Some(base_dir) = &cli.base_dir {
        config.scenario.base_dir = base_dir.clone();
        config.root = None;
    }
    if let Some(export) = &cli.export {
        config.scenario.export = export.clone();
    }
    if !cli.args.is_empty() {
        config.scenario.args = cli
            .args
            .iter()
            .map(|v| ArgLiteral::Text(literal(v)))
            .collect();
    }
    config.output.summary |= cli.summary;
    config.output.show_cycles |= cli.cycles;

    Ok(config)
}

/// Suffixed literal that parses back to exactly `value`
fn literal(value: &Value) -> String {
    format!("{value}{}", value.ty())
}

fn candidates(cli: &Cli, config: &WasmbenchConfig) -> anyhow::Result<Vec<Candidate>> {
    let filter = cli
        .only
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --only pattern")?;
    build_plan(&config.candidates, &config.base_dir(), filter.as_ref())
}

async fn run_comparison<W: Write>(
    cli: &Cli,
    config: &WasmbenchConfig,
    out: W,
) -> anyhow::Result<()> {
    let candidates = candidates(cli, config)?;
    if candidates.is_empty() {
        anyhow::bail!("no candidates to measure");
    }
    let args = config.args()?;

    let loader = ModuleLoader::new(&config.runtime.engine_settings())?;
    let mut reporter = ComparisonReporter::new(loader, out)
        .show_cycles(config.output.show_cycles)
        .with_progress(std::io::stderr().is_terminal())
        .pin_cpu(config.runtime.pin_cpu);

    let report = reporter
        .compare(&candidates, &config.scenario.export, &args)
        .await?;

    if config.output.summary {
        let mut out = reporter.into_inner();
        write!(out, "{}", format_summary(&report))?;
        out.flush()?;
    }
    Ok(())
}

fn list_plan<W: Write>(cli: &Cli, config: &WasmbenchConfig, mut out: W) -> anyhow::Result<()> {
    let candidates = candidates(cli, config)?;
    let args: Vec<String> = config.args()?.iter().map(|a| a.to_string()).collect();

    writeln!(out, "wasmbench plan:")?;
    writeln!(
        out,
        "├── call: {}({})",
        config.scenario.export,
        args.join(", ")
    )?;
    for candidate in &candidates {
        writeln!(out, "│   ├── {} ({})", candidate.label, candidate.describe())?;
    }
    writeln!(out, "{} candidates.", candidates.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wasmbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_arguments_is_default_comparison() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert!(cli.args.is_empty());
        assert!(!cli.summary);
    }

    #[test]
    fn test_parse_run_with_args() {
        let cli = parse(&["run", "output.wasm", "--export", "fib", "--arg", "30"]);
        match cli.command {
            Some(Commands::Run { ref path, .. }) => assert_eq!(path, &PathBuf::from("output.wasm")),
            ref other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.export.as_deref(), Some("fib"));
        assert_eq!(cli.args, vec![Value::I32(30)]);
    }

    #[test]
    fn test_parse_negative_and_typed_args() {
        let cli = parse(&["--arg", "-4", "--arg", "2.5f32"]);
        assert_eq!(cli.args, vec![Value::I32(-4), Value::F32(2.5)]);
    }

    #[test]
    fn test_literal_round_trips() {
        for value in [
            Value::I32(-4),
            Value::I64(30),
            Value::F32(2.5),
            Value::F64(1e-3),
        ] {
            assert_eq!(literal(&value).parse::<Value>().unwrap(), value);
        }
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[scenario]\nexport = \"sum\"\nargs = [1]\n").unwrap();

        let path_str = path.to_str().unwrap();
        let cli = parse(&["--config", path_str, "--arg", "7i64", "--summary"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.scenario.export, "sum");
        assert_eq!(config.args().unwrap(), vec![Value::I64(7)]);
        assert!(config.output.summary);
        assert_eq!(config.base_dir(), dir.path().join("demos/wasm"));
    }

    #[tokio::test]
    async fn test_list_plan_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        let cli = parse(&["list", "--config", path.to_str().unwrap(), "--base-dir", "mods"]);
        let mut out = Vec::new();
        run_with_cli(cli, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("call: fib(30)"));
        assert!(output.contains("Optimized (mods/fib_opt.wasm)"));
        assert!(output.contains("Reference (reference `fib`)"));
        assert!(output.ends_with("3 candidates.\n"));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let path_str = path.to_str().unwrap();

        run_with_cli(parse(&["init", "--config", path_str]), Vec::new())
            .await
            .unwrap();
        assert!(WasmbenchConfig::load(&path).is_ok());

        let err = run_with_cli(parse(&["init", "--config", path_str]), Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        run_with_cli(parse(&["init", "--force", "--config", path_str]), Vec::new())
            .await
            .unwrap();
    }
}
