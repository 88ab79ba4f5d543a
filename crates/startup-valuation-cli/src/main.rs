mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::reference::StagesArgs;
use commands::scenarios::SensitivityArgs;
use commands::valuation::{CompsArgs, DcfArgs, ProjectArgs};
use commands::venture::VcArgs;
use output::OutputFormat;

/// Digital health startup valuation
#[derive(Parser)]
#[command(
    name = "sval",
    version,
    about = "Digital health startup valuation",
    long_about = "Values early-stage digital health companies with decimal precision. \
                  Supports a stage risk-adjusted DCF, growth-adjusted comparables, \
                  the VC method, and WACC x terminal growth sensitivity grids."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Print the rounded, labelled summary instead of the full result
    #[arg(long, global = true)]
    summary: bool,

    /// Emit debug logs on stderr (overrides SVAL_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage risk-adjusted DCF valuation
    Dcf(DcfArgs),
    /// Year-by-year revenue, margin and free cash flow projection
    Project(ProjectArgs),
    /// Growth-adjusted comparable company valuation
    Comps(CompsArgs),
    /// Venture capital method (exit value / target return)
    Vc(VcArgs),
    /// WACC x terminal growth sensitivity grid
    Sensitivity(SensitivityArgs),
    /// List clinical stages and their terminal value risk factors
    Stages(StagesArgs),
    /// List the default comparable peer tickers
    Peers,
    /// Print version information
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SVAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let summary = cli.summary;
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dcf(args) => commands::valuation::run_dcf(args, summary),
        Commands::Project(args) => commands::valuation::run_project(args, summary),
        Commands::Comps(args) => commands::valuation::run_comps(args, summary),
        Commands::Vc(args) => commands::venture::run_vc(args, summary),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args, summary),
        Commands::Stages(args) => commands::reference::run_stages(args),
        Commands::Peers => commands::reference::run_peers(),
        Commands::Version => {
            println!("sval {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
