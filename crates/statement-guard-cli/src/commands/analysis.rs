use clap::Args;
use serde_json::{json, Value};

use statement_guard_core::fingerprint::fingerprint_file;
use statement_guard_core::{analyze_statement, ExtractedDocument};

use super::{reference_time, ConfigArgs};
use crate::input;

/// Arguments for the full statement analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the extracted-document JSON (pages, metadata, trailer)
    #[arg(long)]
    pub input: Option<String>,

    /// Raw document to fingerprint (overrides `source_path` in the input)
    #[arg(long)]
    pub document: Option<String>,

    /// Reference time for future-dated checks, RFC 3339 (defaults to now)
    #[arg(long)]
    pub as_of: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for document fingerprinting
#[derive(Args)]
pub struct FingerprintArgs {
    /// Raw document path
    pub file: String,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut document: ExtractedDocument =
        input::read_input(args.input.as_deref(), "statement analysis")?;
    if let Some(path) = args.document {
        document.source_path = Some(path);
    }
    if document.source_path.is_none() {
        return Err("--document <file> is required when the input has no source_path".into());
    }

    let config = args.config.load()?;
    let as_of = reference_time(args.as_of.as_deref())?;
    let result = analyze_statement(&document, &config, Some(as_of))?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_fingerprint(args: FingerprintArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let path = input::file::resolve_path(&args.file)?;
    let sha256 = fingerprint_file(&path)?;
    Ok(json!({
        "file": path.display().to_string(),
        "sha256": sha256,
    }))
}
