//! Statement header fields: holder, account number and the opening/closing
//! balance anchors. Every miss is an absent value, never an error.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::CompiledRules;
use crate::types::Money;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementFields {
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub opening_balance: Option<Money>,
    pub closing_balance: Option<Money>,
}

fn holder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)account (?:holder|name)\s*[:\-]\s*(.+)").expect("holder regex")
    })
}

fn balances_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)opening balance[:\s]*([0-9.,\-]+).*?closing balance[:\s]*([0-9.,\-]+)")
            .expect("balances regex")
    })
}

pub fn parse_fields(text: &str, bank: &str, rules: &CompiledRules) -> StatementFields {
    let (opening_balance, closing_balance) = match extract_balances(text) {
        Some((o, c)) => (Some(o), Some(c)),
        None => (None, None),
    };
    StatementFields {
        account_holder: extract_account_holder(text),
        account_number: extract_account_number(text, bank, rules),
        opening_balance,
        closing_balance,
    }
}

pub fn extract_account_holder(text: &str) -> Option<String> {
    let caps = holder_re().captures(text)?;
    let name = caps.get(1)?.as_str().trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// First match of the bank's account-number pattern. Banks without a rule
/// (including "Unknown") are not searched.
pub fn extract_account_number(text: &str, bank: &str, rules: &CompiledRules) -> Option<String> {
    let pattern = rules.bank(bank)?.account_number.as_ref()?;
    pattern.find(text).map(|m| m.as_str().to_string())
}

/// Both anchors or neither.
pub fn extract_balances(text: &str) -> Option<(Money, Money)> {
    let caps = balances_re().captures(text)?;
    let opening = parse_amount(caps.get(1)?.as_str())?;
    let closing = parse_amount(caps.get(2)?.as_str())?;
    Some((opening, closing))
}

/// Strip thousands separators and parse; malformed tokens yield `None`.
pub(crate) fn parse_amount(raw: &str) -> Option<Money> {
    Money::from_str(&raw.replace(',', "")).ok()
}
