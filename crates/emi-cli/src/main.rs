mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::loan::{PreviewArgs, QuoteArgs, ScheduleArgs};
use commands::DisplayArgs;

/// Loan EMI and amortization calculations
#[derive(Parser)]
#[command(
    name = "emi",
    version,
    about = "Loan EMI and amortization calculations",
    long_about = "Compute the equated monthly installment (EMI) of a fixed-rate loan, \
                  its total interest and repayment, and a month-by-month amortization \
                  schedule. Amounts are displayed in the chosen currency and locale."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true, env = "EMI_OUTPUT")]
    output: OutputFormat,

    #[command(flatten)]
    display: DisplayArgs,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment, total interest and total repayment for a loan
    Quote(QuoteArgs),
    /// Month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// First, middle and last year of the amortization schedule
    Preview(PreviewArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "emi=debug,emi_core=debug"
    } else {
        "emi=info,emi_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries results only
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = cli.display.currency_format();
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Quote(args) => commands::loan::run_quote(args, &format),
        Commands::Schedule(args) => commands::loan::run_schedule(args, &format),
        Commands::Preview(args) => commands::loan::run_preview(args, &format),
        Commands::Version => {
            println!("emi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
