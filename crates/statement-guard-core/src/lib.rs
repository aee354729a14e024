pub mod analyzer;
pub mod bank;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod fingerprint;
pub mod inspector;
pub mod reconcile;
pub mod scoring;
pub mod transactions;
pub mod types;

pub use analyzer::{analyze, analyze_path, analyze_statement};
pub use config::{AnalysisConfig, CompiledRules, ProfileName, RuleSet, ScoringProfile};
pub use document::{DocumentContainer, ExtractedDocument, PageText, TrailerInfo};
pub use error::StatementGuardError;
pub use types::*;

/// Standard result type for all statement-guard operations
pub type StatementGuardResult<T> = Result<T, StatementGuardError>;
