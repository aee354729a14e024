mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::{AnalyzeArgs, FingerprintArgs};
use commands::rules::RulesArgs;
use commands::signals::{
    IdentifyBankArgs, InspectArgs, ParseFieldsArgs, ReconcileArgs, ScoreArgs, TransactionsArgs,
};

/// Bank statement tamper detection and fraud scoring
#[derive(Parser)]
#[command(
    name = "sguard",
    version,
    about = "Bank statement tamper detection and fraud scoring",
    long_about = "A CLI for screening bank statements for tampering. Combines container \
                  signals, issuer identification, header parsing, transaction analysis \
                  and balance reconciliation into a weighted fraud score."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on an extracted document
    Analyze(AnalyzeArgs),
    /// Identify the issuing bank from text and metadata
    IdentifyBank(IdentifyBankArgs),
    /// Inspect container trailer and metadata for tamper signals
    Inspect(InspectArgs),
    /// Parse holder, account number and balance anchors
    ParseFields(ParseFieldsArgs),
    /// Parse transaction lines, totals, duplicates and future dates
    Transactions(TransactionsArgs),
    /// Reconcile opening and closing balances against flows
    Reconcile(ReconcileArgs),
    /// Score a list of flags and classify
    Score(ScoreArgs),
    /// SHA-256 fingerprint of a raw document
    Fingerprint(FingerprintArgs),
    /// Print the active rule table and scoring profile
    Rules(RulesArgs),
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

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::IdentifyBank(args) => commands::signals::run_identify_bank(args),
        Commands::Inspect(args) => commands::signals::run_inspect(args),
        Commands::ParseFields(args) => commands::signals::run_parse_fields(args),
        Commands::Transactions(args) => commands::signals::run_transactions(args),
        Commands::Reconcile(args) => commands::signals::run_reconcile(args),
        Commands::Score(args) => commands::signals::run_score(args),
        Commands::Fingerprint(args) => commands::analysis::run_fingerprint(args),
        Commands::Rules(args) => commands::rules::run_rules(args),
        Commands::Version => {
            println!("sguard {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            cli.output.print(&value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
