//! Container-level tamper signals: trailer markers, editing-tool
//! fingerprints in the creator/producer fields and metadata date drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CompiledRules;
use crate::document::{metadata_value, TrailerInfo};
use crate::types::{Flag, Severity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub flags: Vec<Flag>,
    /// Raw values kept for audit, never scored
    pub technical: BTreeMap<String, String>,
}

pub fn inspect(
    trailer: &TrailerInfo,
    metadata: &BTreeMap<String, String>,
    rules: &CompiledRules,
) -> Inspection {
    let mut out = Inspection::default();

    // --- Structural markers ---
    if trailer.incremental_update {
        out.flags.push(Flag::new(
            "DOC_TAMPERED_INCREMENTAL",
            "PDF shows incremental updates (Prev in trailer), often indicates editing.",
            Severity::Medium,
        ));
    }
    if trailer.xref_stream {
        out.flags.push(Flag::new(
            "DOC_TAMPERED_XREF_STREAM",
            "Cross-reference stream present, may indicate heavy editing or rebuilding.",
            Severity::Low,
        ));
    }

    // --- Editing tools ---
    let creator = metadata_value(metadata, "Creator").unwrap_or("unknown");
    let producer = metadata_value(metadata, "Producer").unwrap_or("unknown");
    let tool_haystack = format!("{creator} {producer}").to_lowercase();
    for tool in rules.editing_tools() {
        if tool_haystack.contains(tool.as_str()) {
            out.flags.push(Flag::new(
                "DOC_EDITED_TOOL",
                format!("PDF was processed with {} (metadata).", title_case(tool)),
                Severity::High,
            ));
        }
    }

    // --- Identifier pair ---
    if let [first, second, ..] = trailer.ids.as_slice() {
        if first != second {
            out.flags.push(Flag::new(
                "DOC_FORGED_ID_MISMATCH",
                "PDF /ID values differ, strong signal of editing.",
                Severity::High,
            ));
        }
    }

    // --- Dates ---
    let created = metadata_value(metadata, "CreationDate").filter(|s| !s.is_empty());
    let modified = metadata_value(metadata, "ModDate").filter(|s| !s.is_empty());
    out.technical.insert(
        "creation_date_raw".into(),
        created.unwrap_or("unknown").to_string(),
    );
    out.technical.insert(
        "mod_date_raw".into(),
        modified.unwrap_or("unknown").to_string(),
    );
    if let (Some(c), Some(m)) = (created, modified) {
        if c != m {
            out.flags.push(Flag::new(
                "DOC_META_MODIFIED",
                "Creation date and modification date differ, likely edited.",
                Severity::Medium,
            ));
        }
    }

    tracing::debug!(flags = out.flags.len(), "Container inspection complete");
    out
}

/// Upper-case the first letter of every alphabetic run ("online2pdf" -> "Online2Pdf").
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
