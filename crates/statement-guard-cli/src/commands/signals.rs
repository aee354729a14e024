use std::collections::BTreeMap;

use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use statement_guard_core::bank::{flatten_metadata, identify};
use statement_guard_core::fields::parse_fields;
use statement_guard_core::inspector::inspect;
use statement_guard_core::reconcile::reconcile;
use statement_guard_core::scoring::{finalize, ScoreCard};
use statement_guard_core::transactions::analyze_transactions;
use statement_guard_core::{ExtractedDocument, Flag, Money, ScoringProfile};

use super::{reference_time, ProfileArg, RuleTableArgs};
use crate::input;

/// Statement text plus optional document metadata
#[derive(Debug, Deserialize)]
pub struct TextInput {
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Issuer name; identified from text and metadata when absent
    #[serde(default)]
    pub bank: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileInput {
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub total_in: Money,
    pub total_out: Money,
    #[serde(default)]
    pub tolerance: Option<Money>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreInput {
    pub flags: Vec<Flag>,
}

/// Arguments for bank identification
#[derive(Args)]
pub struct IdentifyBankArgs {
    /// Path to JSON input file ({"text", "metadata"})
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub table: RuleTableArgs,
}

/// Arguments for container inspection
#[derive(Args)]
pub struct InspectArgs {
    /// Path to the extracted-document JSON
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub table: RuleTableArgs,
}

/// Arguments for header field parsing
#[derive(Args)]
pub struct ParseFieldsArgs {
    /// Path to JSON input file ({"text", "metadata", "bank"})
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub table: RuleTableArgs,
}

/// Arguments for transaction analysis
#[derive(Args)]
pub struct TransactionsArgs {
    /// Path to JSON input file ({"text"})
    #[arg(long)]
    pub input: Option<String>,

    /// Reference time for future-dated checks, RFC 3339 (defaults to now)
    #[arg(long)]
    pub as_of: Option<String>,

    #[command(flatten)]
    pub table: RuleTableArgs,
}

/// Arguments for balance reconciliation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ReconcileArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Stated opening balance
    #[arg(long)]
    pub opening: Option<Decimal>,

    /// Stated closing balance
    #[arg(long)]
    pub closing: Option<Decimal>,

    /// Total inbound flow
    #[arg(long)]
    pub total_in: Option<Decimal>,

    /// Total outbound flow
    #[arg(long)]
    pub total_out: Option<Decimal>,

    /// Allowed difference (defaults to the profile's tolerance)
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Scoring profile supplying the default tolerance
    #[arg(long, value_enum, default_value = "primary")]
    pub profile: ProfileArg,
}

/// Arguments for flag scoring
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to JSON input file ({"flags": [...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Scoring profile
    #[arg(long, value_enum, default_value = "primary")]
    pub profile: ProfileArg,
}

pub fn run_identify_bank(args: IdentifyBankArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: TextInput = input::read_input(args.input.as_deref(), "bank identification")?;
    let rules = args.table.compiled_rules()?;
    let bank = identify(
        &data.text.to_lowercase(),
        &flatten_metadata(&data.metadata),
        &rules,
    );
    Ok(json!({ "bank": bank }))
}

pub fn run_inspect(args: InspectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document: ExtractedDocument = input::read_input(args.input.as_deref(), "inspection")?;
    let rules = args.table.compiled_rules()?;
    let inspection = inspect(&document.trailer, &document.metadata, &rules);
    Ok(serde_json::to_value(inspection)?)
}

pub fn run_parse_fields(args: ParseFieldsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: TextInput = input::read_input(args.input.as_deref(), "field parsing")?;
    let rules = args.table.compiled_rules()?;
    let bank = data.bank.unwrap_or_else(|| {
        identify(
            &data.text.to_lowercase(),
            &flatten_metadata(&data.metadata),
            &rules,
        )
    });
    let fields = parse_fields(&data.text, &bank, &rules);

    let mut value = serde_json::to_value(fields)?;
    if let Value::Object(ref mut map) = value {
        map.insert("bank".into(), Value::String(bank));
    }
    Ok(value)
}

pub fn run_transactions(args: TransactionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: TextInput = input::read_input(args.input.as_deref(), "transaction analysis")?;
    let rules = args.table.compiled_rules()?;
    let now = reference_time(args.as_of.as_deref())?;
    let analysis = analyze_transactions(&data.text, &rules, now.naive_utc());
    Ok(serde_json::to_value(analysis)?)
}

pub fn run_reconcile(args: ReconcileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: ReconcileInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ReconcileInput {
            opening_balance: args
                .opening
                .ok_or("--opening is required (or provide --input)")?,
            closing_balance: args
                .closing
                .ok_or("--closing is required (or provide --input)")?,
            total_in: args
                .total_in
                .ok_or("--total-in is required (or provide --input)")?,
            total_out: args
                .total_out
                .ok_or("--total-out is required (or provide --input)")?,
            tolerance: args.tolerance,
        }
    };

    let tolerance = data
        .tolerance
        .or(args.tolerance)
        .unwrap_or_else(|| ScoringProfile::for_name(args.profile.into()).reconciliation_tolerance);
    let result = reconcile(
        data.opening_balance,
        data.closing_balance,
        data.total_in,
        data.total_out,
        tolerance,
    )
    .ok_or("Balances are outside the computable decimal range")?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: ScoreInput = input::read_input(args.input.as_deref(), "scoring")?;
    let profile = ScoringProfile::for_name(args.profile.into());
    let mut card = ScoreCard::new(&profile);
    card.raise_all(data.flags);
    let verdict = finalize(card, &profile);
    Ok(serde_json::to_value(verdict)?)
}
