pub mod analysis;
pub mod rules;
pub mod signals;

use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};

use statement_guard_core::{AnalysisConfig, CompiledRules, ProfileName, RuleSet, ScoringProfile};

/// Scoring profile selectable on the command line
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ProfileArg {
    #[default]
    Primary,
    Simplified,
}

impl From<ProfileArg> for ProfileName {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Primary => ProfileName::Primary,
            ProfileArg::Simplified => ProfileName::Simplified,
        }
    }
}

/// Rule table selection for commands that only match text
#[derive(Args, Debug, Clone)]
pub struct RuleTableArgs {
    /// Path to a TOML rule table (defaults to the built-in table)
    #[arg(long)]
    pub rules: Option<String>,
}

impl RuleTableArgs {
    pub fn compiled_rules(&self) -> Result<CompiledRules, Box<dyn std::error::Error>> {
        let set = match self.rules {
            Some(ref path) => RuleSet::load_file(path)?,
            None => RuleSet::builtin()?,
        };
        tracing::debug!(
            source = self.rules.as_deref().unwrap_or("builtin"),
            banks = set.banks.len(),
            "Rule table loaded"
        );
        Ok(CompiledRules::compile(set)?)
    }
}

/// Rule table and scoring profile selection for commands that score
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub table: RuleTableArgs,

    /// Scoring profile
    #[arg(long, value_enum, default_value = "primary")]
    pub profile: ProfileArg,
}

impl ConfigArgs {
    pub fn compiled_rules(&self) -> Result<CompiledRules, Box<dyn std::error::Error>> {
        self.table.compiled_rules()
    }

    pub fn scoring_profile(&self) -> ScoringProfile {
        ScoringProfile::for_name(self.profile.into())
    }

    pub fn load(&self) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
        Ok(AnalysisConfig::new(self.compiled_rules()?, self.scoring_profile()))
    }
}

/// Parse an RFC 3339 reference time, or take the current time.
pub fn reference_time(as_of: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match as_of {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .map_err(|e| format!("--as-of must be RFC 3339 (e.g. 2024-06-30T12:00:00Z): {e}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
