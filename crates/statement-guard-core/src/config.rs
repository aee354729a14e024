//! Detection tables and scoring profiles.
//!
//! Bank rules, editing-tool fingerprints and direction keywords live in a
//! single TOML table (`config/rules.toml` is embedded as the built-in set).
//! Numeric scoring constants are grouped into named [`ScoringProfile`]s so the
//! caller picks one explicitly.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::StatementGuardError;
use crate::types::{Money, Severity};
use crate::StatementGuardResult;

const BUILTIN_RULES: &str = include_str!("../config/rules.toml");

// ---------------------------------------------------------------------------
// Rule tables (as loaded)
// ---------------------------------------------------------------------------

/// Static description of one issuing bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRule {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Fragments searched in the flattened metadata values
    #[serde(default)]
    pub metadata: Vec<String>,
    /// Regexes applied to the lower-cased statement text
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Regex for the account number, applied case-insensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Phrases a genuine statement from this bank is expected to carry
    #[serde(default)]
    pub layout_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionKeywords {
    pub inbound: Vec<String>,
    pub outbound: Vec<String>,
}

/// The full, ordered detection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub editing_tools: Vec<String>,
    pub direction: DirectionKeywords,
    pub banks: Vec<BankRule>,
}

impl RuleSet {
    /// The table shipped with the crate.
    pub fn builtin() -> StatementGuardResult<Self> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    pub fn from_toml_str(content: &str) -> StatementGuardResult<Self> {
        let rules: RuleSet = toml::from_str(content)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> StatementGuardResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StatementGuardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), banks = rules.banks.len(), "Loaded rule table");
        Ok(rules)
    }

    fn validate(&self) -> StatementGuardResult<()> {
        if self.banks.is_empty() {
            return Err(StatementGuardError::RuleConfig(
                "rule table must define at least one bank".into(),
            ));
        }
        let mut seen = HashSet::new();
        for bank in &self.banks {
            if bank.name.trim().is_empty() {
                return Err(StatementGuardError::RuleConfig("bank name must not be empty".into()));
            }
            if !seen.insert(bank.name.as_str()) {
                return Err(StatementGuardError::RuleConfig(format!(
                    "duplicate bank rule '{}'",
                    bank.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CompiledBank {
    pub name: String,
    pub keywords: Vec<String>,
    pub metadata: Vec<String>,
    pub patterns: Vec<Regex>,
    pub account_number: Option<Regex>,
    pub layout_keywords: Vec<String>,
}

/// A [`RuleSet`] with keywords lower-cased and every regex compiled.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    source: RuleSet,
    banks: Vec<CompiledBank>,
    editing_tools: Vec<String>,
    inbound: Vec<String>,
    outbound: Vec<String>,
}

impl CompiledRules {
    pub fn compile(source: RuleSet) -> StatementGuardResult<Self> {
        source.validate()?;

        let mut banks = Vec::with_capacity(source.banks.len());
        for rule in &source.banks {
            let patterns = rule
                .patterns
                .iter()
                .map(|p| compile_pattern(&rule.name, p, false))
                .collect::<StatementGuardResult<Vec<_>>>()?;
            let account_number = rule
                .account_number
                .as_deref()
                .map(|p| compile_pattern(&rule.name, p, true))
                .transpose()?;
            banks.push(CompiledBank {
                name: rule.name.clone(),
                keywords: lower_all(&rule.keywords),
                metadata: lower_all(&rule.metadata),
                patterns,
                account_number,
                layout_keywords: lower_all(&rule.layout_keywords),
            });
        }

        Ok(Self {
            editing_tools: lower_all(&source.editing_tools),
            inbound: lower_all(&source.direction.inbound),
            outbound: lower_all(&source.direction.outbound),
            banks,
            source,
        })
    }

    pub fn builtin() -> StatementGuardResult<Self> {
        Self::compile(RuleSet::builtin()?)
    }

    /// Banks in evaluation order.
    pub fn banks(&self) -> &[CompiledBank] {
        &self.banks
    }

    pub fn bank(&self, name: &str) -> Option<&CompiledBank> {
        self.banks.iter().find(|b| b.name == name)
    }

    pub fn editing_tools(&self) -> &[String] {
        &self.editing_tools
    }

    pub fn inbound_keywords(&self) -> &[String] {
        &self.inbound
    }

    pub fn outbound_keywords(&self) -> &[String] {
        &self.outbound
    }

    pub fn source(&self) -> &RuleSet {
        &self.source
    }
}

fn lower_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

fn compile_pattern(bank: &str, pattern: &str, case_insensitive: bool) -> StatementGuardResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| {
            StatementGuardError::RuleConfig(format!("bank '{bank}': invalid pattern '{pattern}': {e}"))
        })
}

// ---------------------------------------------------------------------------
// Scoring profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileName {
    #[default]
    Primary,
    Simplified,
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileName::Primary => f.write_str("primary"),
            ProfileName::Simplified => f.write_str("simplified"),
        }
    }
}

impl FromStr for ProfileName {
    type Err = StatementGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(ProfileName::Primary),
            "simplified" => Ok(ProfileName::Simplified),
            other => Err(StatementGuardError::InvalidInput {
                field: "profile".into(),
                reason: format!("unknown scoring profile '{other}', expected 'primary' or 'simplified'"),
            }),
        }
    }
}

/// Score contribution per severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectWhen {
    /// Reject when the score is strictly greater than the threshold
    Above,
    /// Reject when the score reaches the threshold
    AtOrAbove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub name: ProfileName,
    pub weights: SeverityWeights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_cap: Option<u32>,
    /// Largest tolerated gap between stated and computed closing balance
    pub reconciliation_tolerance: Money,
    pub reject_threshold: u32,
    pub reject_when: RejectWhen,
    /// Raise LAYOUT_MISMATCH when a known bank's layout phrases are missing
    pub layout_check: bool,
    pub pass_code: String,
    pub fail_code: String,
}

impl ScoringProfile {
    pub fn primary() -> Self {
        Self {
            name: ProfileName::Primary,
            weights: SeverityWeights {
                low: 5,
                medium: 15,
                high: 30,
                critical: 45,
            },
            score_cap: None,
            reconciliation_tolerance: dec!(1.0),
            reject_threshold: 20,
            reject_when: RejectWhen::Above,
            layout_check: false,
            pass_code: "DOC_ORIGINAL_VERIFIED".into(),
            fail_code: "DOC_FRAUDULENT_TAMPERED".into(),
        }
    }

    pub fn simplified() -> Self {
        Self {
            name: ProfileName::Simplified,
            weights: SeverityWeights {
                low: 5,
                medium: 10,
                high: 25,
                critical: 40,
            },
            score_cap: Some(100),
            reconciliation_tolerance: dec!(5.0),
            reject_threshold: 50,
            reject_when: RejectWhen::AtOrAbove,
            layout_check: true,
            pass_code: "DOC_ACCEPTED_VERIFIED".into(),
            fail_code: "DOC_REJECTED_MODIFIED".into(),
        }
    }

    pub fn for_name(name: ProfileName) -> Self {
        match name {
            ProfileName::Primary => Self::primary(),
            ProfileName::Simplified => Self::simplified(),
        }
    }

    /// Apply the optional cap to a raw weight sum.
    pub fn cap(&self, raw: u32) -> u32 {
        match self.score_cap {
            Some(max) => raw.min(max),
            None => raw,
        }
    }

    /// The single threshold that separates the two outcomes.
    pub fn rejects(&self, score: u32) -> bool {
        match self.reject_when {
            RejectWhen::Above => score > self.reject_threshold,
            RejectWhen::AtOrAbove => score >= self.reject_threshold,
        }
    }
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::primary()
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Everything the pipeline needs besides the document itself.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub rules: CompiledRules,
    pub profile: ScoringProfile,
}

impl AnalysisConfig {
    pub fn new(rules: CompiledRules, profile: ScoringProfile) -> Self {
        Self { rules, profile }
    }

    /// Built-in rule table with the named profile.
    pub fn builtin(profile: ProfileName) -> StatementGuardResult<Self> {
        Ok(Self::new(CompiledRules::builtin()?, ScoringProfile::for_name(profile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_builtin_rules_parse_and_compile() {
        let rules = CompiledRules::builtin().unwrap();
        let names: Vec<&str> = rules.banks().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Capitec",
                "FNB",
                "Standard Bank",
                "ABSA",
                "Nedbank",
                "Discovery Bank",
                "TymeBank",
                "African Bank",
            ]
        );
        assert!(rules.banks().iter().all(|b| b.account_number.is_some()));
        assert_eq!(rules.editing_tools().len(), 11);
    }

    #[test]
    fn test_direction_keywords_keep_spacing() {
        let rules = CompiledRules::builtin().unwrap();
        assert!(rules.inbound_keywords().contains(&"cr ".to_string()));
        assert!(rules.outbound_keywords().contains(&" dr".to_string()));
    }

    #[test]
    fn test_keywords_lowercased_on_compile() {
        let toml = r#"
editing_tools = ["PhotoShop"]
[direction]
inbound = ["SALARY"]
outbound = ["Debit"]
[[banks]]
name = "Example"
keywords = ["Example Bank"]
"#;
        let rules = CompiledRules::compile(RuleSet::from_toml_str(toml).unwrap()).unwrap();
        assert_eq!(rules.editing_tools(), &["photoshop".to_string()]);
        assert_eq!(rules.banks()[0].keywords, vec!["example bank".to_string()]);
        assert_eq!(rules.inbound_keywords(), &["salary".to_string()]);
    }

    #[test]
    fn test_empty_bank_table_rejected() {
        let toml = r#"
editing_tools = []
banks = []
[direction]
inbound = []
outbound = []
"#;
        assert!(matches!(
            RuleSet::from_toml_str(toml),
            Err(StatementGuardError::RuleConfig(_))
        ));
    }

    #[test]
    fn test_duplicate_bank_rejected() {
        let toml = r#"
editing_tools = []
[direction]
inbound = []
outbound = []
[[banks]]
name = "A"
[[banks]]
name = "A"
"#;
        assert!(RuleSet::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_bad_regex_rejected_at_compile() {
        let toml = r#"
editing_tools = []
[direction]
inbound = []
outbound = []
[[banks]]
name = "Broken"
patterns = ['(unclosed']
"#;
        let rules = RuleSet::from_toml_str(toml).unwrap();
        let err = CompiledRules::compile(rules).unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RuleSet::load_file("/definitely/not/here/rules.toml").unwrap_err();
        assert!(matches!(err, StatementGuardError::Io { .. }));
    }

    #[test]
    fn test_profiles() {
        let p = ScoringProfile::primary();
        assert_eq!(p.weights.weight(Severity::Critical), 45);
        assert!(!p.rejects(20));
        assert!(p.rejects(21));
        assert_eq!(p.cap(500), 500);

        let s = ScoringProfile::simplified();
        assert_eq!(s.weights.weight(Severity::Medium), 10);
        assert!(!s.rejects(49));
        assert!(s.rejects(50));
        assert_eq!(s.cap(130), 100);
        assert_eq!(s.reconciliation_tolerance, Decimal::from(5));
    }

    #[test]
    fn test_profile_name_parse() {
        assert_eq!("Simplified".parse::<ProfileName>().unwrap(), ProfileName::Simplified);
        assert_eq!("primary".parse::<ProfileName>().unwrap(), ProfileName::Primary);
        assert!("strict".parse::<ProfileName>().is_err());
    }
}
