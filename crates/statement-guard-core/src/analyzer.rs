//! End-to-end statement analysis.
//!
//! Each call builds a fresh [`FraudReport`] from one document: container
//! inspection, bank identification, field parsing, transaction analysis,
//! balance reconciliation, then scoring. The [`ScoreCard`] is the only
//! writer of the score; the verdict is taken once, at the end.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::bank::{flatten_metadata, identify, validate_layout};
use crate::config::{AnalysisConfig, ScoringProfile};
use crate::document::{assemble_text, DocumentContainer, ExtractedDocument};
use crate::error::StatementGuardError;
use crate::fields::parse_fields;
use crate::fingerprint::{fingerprint, read_document};
use crate::inspector::inspect;
use crate::reconcile::reconcile;
use crate::scoring::{finalize, summary, ScoreCard};
use crate::transactions::analyze_transactions;
use crate::types::{with_metadata, ComputationOutput, Flag, FraudReport, Severity, UNKNOWN_BANK};
use crate::StatementGuardResult;

/// Analyze one document. `now` is the reference point for future-dated
/// transactions; everything else is a pure function of the inputs.
pub fn analyze<C: DocumentContainer + ?Sized>(
    raw: &[u8],
    container: &C,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> FraudReport {
    let rules = &config.rules;
    let profile = &config.profile;
    let metadata = container.metadata();

    let mut report = FraudReport::default();
    let mut card = ScoreCard::new(profile);

    // --- Container signals ---
    let inspection = inspect(container.trailer(), metadata, rules);
    card.raise_all(inspection.flags);
    report.technical.extend(inspection.technical);

    // --- Text ---
    let assembled = assemble_text(container.pages());
    report
        .technical
        .insert("pages_total".into(), assembled.pages_total.to_string());
    report
        .technical
        .insert("pages_failed".into(), assembled.pages_failed.to_string());
    report
        .technical
        .insert("profile".into(), profile.name.to_string());
    let text = assembled.text;
    let text_lower = text.to_lowercase();

    // --- Issuer and header fields ---
    report.bank = identify(&text_lower, &flatten_metadata(metadata), rules);
    let fields = parse_fields(&text, &report.bank, rules);
    report.account_holder = fields.account_holder;
    report.account_number = fields.account_number;

    if profile.layout_check {
        if let Some(flag) = validate_layout(&report.bank, &text_lower, rules) {
            card.raise(flag);
        }
    }

    // --- Transactions ---
    let tx = analyze_transactions(&text, rules, now.naive_utc());
    report.total_in = tx.total_in;
    report.total_out = tx.total_out;
    report.transaction_count = tx.transactions.len();
    report.duplicate_count = tx.duplicate_count;
    report.future_dated_count = tx.future_count;
    report.important_transactions = tx.important_transactions;

    // --- Reconciliation (needs both anchors) ---
    if let (Some(opening), Some(closing)) = (fields.opening_balance, fields.closing_balance) {
        report.opening_balance = Some(opening);
        report.closing_balance = Some(closing);
        match reconcile(
            opening,
            closing,
            tx.total_in,
            tx.total_out,
            profile.reconciliation_tolerance,
        ) {
            Some(rec) => {
                report.calculated_closing = Some(rec.calculated_closing);
                report.balance_difference = Some(rec.balance_difference);
                if let Some(flag) = rec.flag {
                    card.raise(flag);
                }
            }
            None => tracing::warn!("Balance arithmetic out of range, skipping reconciliation"),
        }
    } else {
        tracing::debug!("Balance anchors not found, skipping reconciliation");
    }

    if tx.future_count > 0 {
        card.raise(Flag::new(
            "DOC_INVALID_DATES",
            "One or more transactions appear to be dated in the future.",
            Severity::Medium,
        ));
    }

    report.file_hash = fingerprint(raw);

    // --- Verdict ---
    let verdict = finalize(card, profile);
    report.fraud_score = verdict.fraud_score;
    report.status = verdict.status;
    report.severity = verdict.severity;
    report.fraud_code = Some(verdict.fraud_code);
    report.flags = verdict.flags;
    report.summary = summary(
        report.fraud_score,
        report.status,
        &report.bank,
        report.total_in,
        report.total_out,
    );
    report
}

/// Read the raw document from disk, then analyze it against the current time.
/// An unreadable file aborts the analysis.
pub fn analyze_path<C: DocumentContainer + ?Sized, P: AsRef<Path>>(
    path: P,
    container: &C,
    config: &AnalysisConfig,
) -> StatementGuardResult<FraudReport> {
    let raw = read_document(path)?;
    Ok(analyze(&raw, container, config, Utc::now()))
}

#[derive(Serialize)]
struct AnalysisAssumptions<'a> {
    profile: &'a ScoringProfile,
    bank_rules: usize,
    editing_tools: usize,
    as_of: DateTime<Utc>,
}

/// Analyze an extracted document whose `source_path` points at the raw file,
/// wrapped in the standard output envelope.
pub fn analyze_statement(
    document: &ExtractedDocument,
    config: &AnalysisConfig,
    as_of: Option<DateTime<Utc>>,
) -> StatementGuardResult<ComputationOutput<FraudReport>> {
    let start = Instant::now();

    let path = document
        .source_path
        .as_deref()
        .ok_or_else(|| StatementGuardError::InvalidInput {
            field: "source_path".into(),
            reason: "Path to the raw document is required for fingerprinting".into(),
        })?;
    let raw = read_document(path)?;
    let now = as_of.unwrap_or_else(Utc::now);
    let report = analyze(&raw, document, config, now);
    let warnings = report_warnings(&report);

    let assumptions = AnalysisAssumptions {
        profile: &config.profile,
        bank_rules: config.rules.banks().len(),
        editing_tools: config.rules.editing_tools().len(),
        as_of: now,
    };
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Bank statement tamper heuristics with weighted flag scoring",
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}

/// Degradations worth surfacing next to the report.
pub fn report_warnings(report: &FraudReport) -> Vec<String> {
    let mut warnings = Vec::new();
    let failed = report
        .technical
        .get("pages_failed")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    if failed > 0 {
        warnings.push(format!("{failed} page(s) could not be extracted and were skipped"));
    }
    if report.bank == UNKNOWN_BANK {
        warnings.push("Issuing bank not recognised; account number not extracted".into());
    }
    if report.opening_balance.is_none() {
        warnings.push("Opening/closing balance not found; reconciliation skipped".into());
    } else if report.calculated_closing.is_none() {
        warnings.push("Balances out of computable range; reconciliation skipped".into());
    }
    if report.transaction_count == 0 {
        warnings.push("No transaction lines detected".into());
    }
    if report.duplicate_count > 0 {
        warnings.push(format!(
            "{} possible duplicate transaction(s) detected (not scored)",
            report.duplicate_count
        ));
    }
    warnings
}
