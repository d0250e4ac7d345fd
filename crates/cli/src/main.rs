mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Diophantine multiplicity run orchestration and report narration.
#[derive(Parser)]
#[command(
    name = "dioph",
    version,
    about = "Diophantine multiplicity run orchestration and report narration"
)]
struct Cli {
    /// Working directory holding the notebook, results/ and figures/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (default: dioph.toml under --root, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the computation notebook and verify its artifacts
    Run {
        #[command(flatten)]
        exec: ExecArgs,
        /// Exit 1 when optional figures are missing
        #[arg(long)]
        strict: bool,
    },

    /// Write results/llm_analysis.md from the current artifacts
    Narrate {
        #[command(flatten)]
        narrate: NarrateArgs,
    },

    /// Run the notebook, then narrate unless execution failed
    All {
        #[command(flatten)]
        exec: ExecArgs,
        #[command(flatten)]
        narrate: NarrateArgs,
        /// Exit 1 when optional figures are missing
        #[arg(long)]
        strict: bool,
    },
}

/// Overrides for notebook execution.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ExecArgs {
    /// Notebook to execute, relative to --root
    #[arg(long)]
    pub notebook: Option<PathBuf>,
    /// Program used for in-place execution (default: jupyter)
    #[arg(long)]
    pub jupyter: Option<String>,
    /// Interpreter for the converted-script fallback (default: python3)
    #[arg(long)]
    pub python: Option<String>,
    /// Upper bound for each execution command, in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

/// Overrides for report narration.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct NarrateArgs {
    /// Never contact the narrative service
    #[arg(long)]
    pub offline: bool,
    /// Model name for the narrative service
    #[arg(long)]
    pub model: Option<String>,
    /// Base URL of the chat-completions API
    #[arg(long)]
    pub endpoint: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.quiet);

    let file_config = match config::load(&cli.root, cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Run { exec, strict } => {
            commands::run::cmd_run(&cli.root, &file_config, &exec, strict, cli.output, cli.quiet)
        }
        Commands::Narrate { narrate } => {
            commands::narrate::cmd_narrate(&cli.root, &file_config, &narrate, cli.output, cli.quiet)
        }
        Commands::All {
            exec,
            narrate,
            strict,
        } => commands::cmd_all(
            &cli.root,
            &file_config,
            &exec,
            &narrate,
            strict,
            cli.output,
            cli.quiet,
        ),
    };
    process::exit(code);
}

/// Print an error respecting --output and --quiet.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
