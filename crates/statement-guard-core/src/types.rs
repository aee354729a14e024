use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Sentinel issuer name when no bank rule matches.
pub const UNKNOWN_BANK: &str = "Unknown";

/// Ordinal risk label attached to every flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A discrete piece of evidence contributing to the fraud score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl Flag {
    pub fn new(code: &str, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Flow direction of a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("in"),
            Direction::Out => f.write_str("out"),
        }
    }
}

/// Final classification of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Valid,
    Fraudulent,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Valid => f.write_str("valid"),
            Status::Fraudulent => f.write_str("fraudulent"),
        }
    }
}

/// One parsed statement line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Raw source text of the line (trimmed)
    pub line: String,
    /// Signed amount as printed on the line
    pub amount: Money,
    pub direction: Direction,
    /// Date token as matched on the line, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_raw: Option<String>,
}

/// Report-facing summary of a significant transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportantTransaction {
    pub description: String,
    pub amount: Money,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_raw: Option<String>,
}

/// Root output of a statement analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudReport {
    pub status: Status,
    pub fraud_score: u32,
    pub severity: Severity,
    pub fraud_code: Option<String>,
    pub flags: Vec<Flag>,
    pub summary: String,
    pub bank: String,
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub opening_balance: Option<Money>,
    pub closing_balance: Option<Money>,
    pub calculated_closing: Option<Money>,
    pub balance_difference: Option<Money>,
    pub total_in: Money,
    pub total_out: Money,
    pub transaction_count: usize,
    pub duplicate_count: usize,
    pub future_dated_count: usize,
    pub important_transactions: Vec<ImportantTransaction>,
    pub file_hash: String,
    pub technical: BTreeMap<String, String>,
}

impl Default for FraudReport {
    fn default() -> Self {
        Self {
            status: Status::Valid,
            fraud_score: 0,
            severity: Severity::Low,
            fraud_code: None,
            flags: Vec::new(),
            summary: String::new(),
            bank: UNKNOWN_BANK.to_string(),
            account_holder: None,
            account_number: None,
            opening_balance: None,
            closing_balance: None,
            calculated_closing: None,
            balance_difference: None,
            total_in: Decimal::ZERO,
            total_out: Decimal::ZERO,
            transaction_count: 0,
            duplicate_count: 0,
            future_dated_count: 0,
            important_transactions: Vec::new(),
            file_hash: String::new(),
            technical: BTreeMap::new(),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
