use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use statement_guard_core::bank::{flatten_metadata, identify};
use statement_guard_core::scoring::{finalize, ScoreCard};
use statement_guard_core::{
    analyze_statement as run_analysis, AnalysisConfig, CompiledRules, ExtractedDocument, Flag,
    ProfileName, RuleSet, ScoringProfile,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Built-in rules, or an override table passed inline as TOML.
fn compile_rules(rules_toml: Option<&str>) -> NapiResult<CompiledRules> {
    let set = match rules_toml {
        Some(toml) => RuleSet::from_toml_str(toml).map_err(to_napi_error)?,
        None => RuleSet::builtin().map_err(to_napi_error)?,
    };
    CompiledRules::compile(set).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    document: ExtractedDocument,
    #[serde(default)]
    profile: ProfileName,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    rules_toml: Option<String>,
}

#[derive(Deserialize)]
struct IdentifyRequest {
    text: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    rules_toml: Option<String>,
}

#[derive(Deserialize)]
struct ScoreRequest {
    flags: Vec<Flag>,
    #[serde(default)]
    profile: ProfileName,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_statement(input_json: String) -> NapiResult<String> {
    let request: AnalyzeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = AnalysisConfig::new(
        compile_rules(request.rules_toml.as_deref())?,
        ScoringProfile::for_name(request.profile),
    );
    let output =
        run_analysis(&request.document, &config, request.as_of).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn identify_bank(input_json: String) -> NapiResult<String> {
    let request: IdentifyRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rules = compile_rules(request.rules_toml.as_deref())?;
    let bank = identify(
        &request.text.to_lowercase(),
        &flatten_metadata(&request.metadata),
        &rules,
    );
    serde_json::to_string(&serde_json::json!({ "bank": bank })).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[napi]
pub fn score_flags(input_json: String) -> NapiResult<String> {
    let request: ScoreRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let profile = ScoringProfile::for_name(request.profile);
    let mut card = ScoreCard::new(&profile);
    card.raise_all(request.flags);
    let verdict = finalize(card, &profile);
    serde_json::to_string(&verdict).map_err(to_napi_error)
}
