//! Issuer identification and layout validation.

use std::collections::BTreeMap;

use crate::config::CompiledRules;
use crate::types::{Flag, Severity, UNKNOWN_BANK};

/// Space-joined, lower-cased metadata values.
pub fn flatten_metadata(metadata: &BTreeMap<String, String>) -> String {
    metadata
        .values()
        .map(|v| v.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name the issuing bank.
///
/// Rules are tried in table order. Within a rule, a text keyword, a metadata
/// fragment or a regex pattern over the text is enough; the first rule that
/// matches wins. `text_lower` and `metadata_flat` must already be lower-cased.
pub fn identify(text_lower: &str, metadata_flat: &str, rules: &CompiledRules) -> String {
    for bank in rules.banks() {
        if bank.keywords.iter().any(|k| text_lower.contains(k.as_str())) {
            tracing::debug!(bank = %bank.name, via = "keyword", "Bank identified");
            return bank.name.clone();
        }
        if bank.metadata.iter().any(|m| metadata_flat.contains(m.as_str())) {
            tracing::debug!(bank = %bank.name, via = "metadata", "Bank identified");
            return bank.name.clone();
        }
        if bank.patterns.iter().any(|re| re.is_match(text_lower)) {
            tracing::debug!(bank = %bank.name, via = "pattern", "Bank identified");
            return bank.name.clone();
        }
    }
    UNKNOWN_BANK.to_string()
}

/// Check that a known bank's statement carries at least one of its expected
/// layout phrases. Unknown banks and banks without layout phrases pass.
pub fn validate_layout(bank: &str, text_lower: &str, rules: &CompiledRules) -> Option<Flag> {
    let rule = rules.bank(bank)?;
    if rule.layout_keywords.is_empty() {
        return None;
    }
    if rule.layout_keywords.iter().any(|k| text_lower.contains(k.as_str())) {
        return None;
    }
    Some(Flag::new(
        "LAYOUT_MISMATCH",
        format!("Layout does not match expected pattern for {bank}"),
        Severity::High,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CompiledRules {
        CompiledRules::builtin().unwrap()
    }

    fn no_meta() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_keyword_match() {
        let r = rules();
        assert_eq!(identify("welcome to nedbank online", "", &r), "Nedbank");
        assert_eq!(identify("absa bank limited", "", &r), "ABSA");
    }

    #[test]
    fn test_metadata_match() {
        let mut meta = no_meta();
        meta.insert("/Author".into(), "Capitec Statements".into());
        let flat = flatten_metadata(&meta);
        assert_eq!(identify("statement of account", &flat, &rules()), "Capitec");
    }

    #[test]
    fn test_pattern_match() {
        assert_eq!(
            identify("visit africanbank.co.za for help", "", &rules()),
            "African Bank"
        );
        assert_eq!(identify("ref dbank123456", "", &rules()), "Discovery Bank");
    }

    #[test]
    fn test_first_rule_wins() {
        // both capitec and fnb keywords present: capitec comes first in the table
        assert_eq!(
            identify("first national bank transfer to capitec bank", "", &rules()),
            "Capitec"
        );
    }

    #[test]
    fn test_earlier_bank_metadata_beats_later_bank_keyword() {
        let flat = "nedbank export";
        assert_eq!(identify("absa bank", flat, &rules()), "ABSA");
        assert_eq!(identify("vitality money", flat, &rules()), "Nedbank");
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            identify("statement of account\nopening balance 10.00", "", &rules()),
            UNKNOWN_BANK
        );
    }

    #[test]
    fn test_flatten_metadata_lowercases_values() {
        let mut meta = no_meta();
        meta.insert("/Creator".into(), "FNB Online".into());
        meta.insert("/Producer".into(), "PDFlib".into());
        assert_eq!(flatten_metadata(&meta), "fnb online pdflib");
    }

    #[test]
    fn test_layout_mismatch() {
        let flag = validate_layout("Nedbank", "a statement with no branding", &rules()).unwrap();
        assert_eq!(flag.code, "LAYOUT_MISMATCH");
        assert_eq!(flag.severity, Severity::High);
        assert!(flag.message.contains("Nedbank"));
    }

    #[test]
    fn test_layout_ok_and_unknown() {
        assert!(validate_layout("Nedbank", "see money differently", &rules()).is_none());
        assert!(validate_layout(UNKNOWN_BANK, "anything", &rules()).is_none());
    }
}
