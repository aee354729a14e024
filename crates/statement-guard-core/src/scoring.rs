//! Flag accumulation, weighted scoring and final classification.

use serde::{Deserialize, Serialize};

use crate::config::{ScoringProfile, SeverityWeights};
use crate::types::{Flag, Money, Severity, Status};

pub const REJECT_CODE: &str = "REJECT_DOCUMENT";

/// Sum of severity weights, capped when the profile caps. Order-independent.
pub fn score_flags(flags: &[Flag], profile: &ScoringProfile) -> u32 {
    let raw = flags
        .iter()
        .fold(0u32, |acc, f| acc.saturating_add(profile.weights.weight(f.severity)));
    profile.cap(raw)
}

/// Append-only flag ledger. The running score only grows.
#[derive(Debug, Clone)]
pub struct ScoreCard {
    weights: SeverityWeights,
    flags: Vec<Flag>,
    score: u32,
}

impl ScoreCard {
    pub fn new(profile: &ScoringProfile) -> Self {
        Self {
            weights: profile.weights,
            flags: Vec::new(),
            score: 0,
        }
    }

    pub fn raise(&mut self, flag: Flag) {
        self.score = self.score.saturating_add(self.weights.weight(flag.severity));
        tracing::debug!(code = %flag.code, severity = %flag.severity, score = self.score, "Flag raised");
        self.flags.push(flag);
    }

    pub fn raise_all(&mut self, flags: impl IntoIterator<Item = Flag>) {
        for flag in flags {
            self.raise(flag);
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub fraud_score: u32,
    pub status: Status,
    pub severity: Severity,
    pub fraud_code: String,
    /// Detected flags, plus the rejection notice when rejected
    pub flags: Vec<Flag>,
}

/// Fix the score, then classify against the profile's single threshold.
/// The rejection notice is appended after the score is fixed and carries no
/// weight of its own.
pub fn finalize(card: ScoreCard, profile: &ScoringProfile) -> Verdict {
    let fraud_score = profile.cap(card.score);
    let mut flags = card.flags;

    let verdict = if profile.rejects(fraud_score) {
        flags.push(Flag::new(
            REJECT_CODE,
            "Strong evidence of tampering detected. PLEASE REJECT THIS DOCUMENT AND CANCEL THE APPLICATION.",
            Severity::Critical,
        ));
        Verdict {
            fraud_score,
            status: Status::Fraudulent,
            severity: Severity::High,
            fraud_code: profile.fail_code.clone(),
            flags,
        }
    } else {
        Verdict {
            fraud_score,
            status: Status::Valid,
            severity: Severity::Low,
            fraud_code: profile.pass_code.clone(),
            flags,
        }
    };

    tracing::info!(
        score = verdict.fraud_score,
        status = %verdict.status,
        code = %verdict.fraud_code,
        "Document classified"
    );
    verdict
}

/// One-line outcome. Deliberately carries no personal data.
pub fn summary(score: u32, status: Status, bank: &str, total_in: Money, total_out: Money) -> String {
    format!("Score: {score} | Status: {status} | Bank: {bank} | In: {total_in} | Out: {total_out}")
}
