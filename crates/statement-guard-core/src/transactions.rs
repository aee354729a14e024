//! Statement line parsing, flow aggregation and date anomalies.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CompiledRules;
use crate::fields::parse_amount;
use crate::types::{Direction, ImportantTransaction, Money, Transaction};

/// Number of transactions surfaced on the report.
pub const IMPORTANT_LIMIT: usize = 5;
/// Longest description kept for an important transaction, in characters.
pub const DESCRIPTION_LIMIT: usize = 200;
/// Header lines carrying the balance anchors are not statement entries.
const BALANCE_ANCHORS: [&str; 2] = ["opening balance", "closing balance"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionAnalysis {
    pub transactions: Vec<Transaction>,
    pub total_in: Money,
    pub total_out: Money,
    pub important_transactions: Vec<ImportantTransaction>,
    pub duplicate_count: usize,
    pub future_count: usize,
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?[0-9][0-9.,]*\.\d{2}").expect("amount regex"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2}\s+[A-Za-z]{3}\s+\d{4}|\d{4}-\d{2}-\d{2})\b").expect("date regex")
    })
}

pub fn analyze_transactions(
    text: &str,
    rules: &CompiledRules,
    now: NaiveDateTime,
) -> TransactionAnalysis {
    let parsed = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_balance_anchor(l))
        .filter_map(|l| parse_line(l, rules));

    let mut flows = FlowTotals::default();
    let transactions: Vec<Transaction> = parsed.filter(|t| flows.admit(t)).collect();
    let (total_in, total_out) = flows.rounded();
    let important_transactions = rank_important(&transactions);
    let duplicate_count = count_duplicates(&transactions);
    let future_count = count_future_dated(&transactions, now);

    tracing::debug!(
        transactions = transactions.len(),
        duplicate_count,
        future_count,
        "Transaction analysis complete"
    );

    TransactionAnalysis {
        transactions,
        total_in,
        total_out,
        important_transactions,
        duplicate_count,
        future_count,
    }
}

fn is_balance_anchor(line: &str) -> bool {
    let lower = line.to_lowercase();
    BALANCE_ANCHORS.iter().any(|a| lower.contains(a))
}

/// A line is a transaction only if it carries a two-decimal amount.
pub fn parse_line(line: &str, rules: &CompiledRules) -> Option<Transaction> {
    let amount = parse_amount(amount_re().find(line)?.as_str())?;
    let direction = classify_direction(line, amount, rules);
    let date_raw = date_re().find(line).map(|m| m.as_str().to_string());
    Some(Transaction {
        line: line.to_string(),
        amount,
        direction,
        date_raw,
    })
}

/// Inbound keywords, then outbound keywords, then the sign of the amount.
pub fn classify_direction(line: &str, amount: Money, rules: &CompiledRules) -> Direction {
    let lower = line.to_lowercase();
    if rules.inbound_keywords().iter().any(|k| lower.contains(k.as_str())) {
        Direction::In
    } else if rules.outbound_keywords().iter().any(|k| lower.contains(k.as_str())) {
        Direction::Out
    } else if amount > Decimal::ZERO {
        Direction::In
    } else {
        Direction::Out
    }
}

/// Running flow sums. Inbound only counts positive amounts; outbound counts
/// magnitudes.
#[derive(Debug, Clone, Copy, Default)]
struct FlowTotals {
    total_in: Money,
    total_out: Money,
}

impl FlowTotals {
    /// Add one transaction. An amount that would push a sum out of the decimal
    /// range is refused and the sums stay as they were.
    fn admit(&mut self, t: &Transaction) -> bool {
        let (sum, delta) = match t.direction {
            Direction::In if t.amount > Decimal::ZERO => (&mut self.total_in, t.amount),
            Direction::In => return true,
            Direction::Out => (&mut self.total_out, t.amount.abs()),
        };
        match sum.checked_add(delta) {
            Some(next) => {
                *sum = next;
                true
            }
            None => {
                tracing::warn!(direction = %t.direction, "Amount overflows running total, line dropped");
                false
            }
        }
    }

    fn rounded(&self) -> (Money, Money) {
        (self.total_in.round_dp(2), self.total_out.round_dp(2))
    }
}

/// Flow totals rounded to 2 dp. Amounts that would overflow a sum are skipped.
pub fn totals(transactions: &[Transaction]) -> (Money, Money) {
    let mut flows = FlowTotals::default();
    for t in transactions {
        flows.admit(t);
    }
    flows.rounded()
}

pub fn rank_important(transactions: &[Transaction]) -> Vec<ImportantTransaction> {
    let mut ranked: Vec<&Transaction> = transactions.iter().collect();
    // stable: equal magnitudes keep line order
    ranked.sort_by(|a, b| b.amount.abs().cmp(&a.amount.abs()));
    ranked
        .into_iter()
        .take(IMPORTANT_LIMIT)
        .map(|t| ImportantTransaction {
            description: t.line.chars().take(DESCRIPTION_LIMIT).collect(),
            amount: t.amount,
            direction: t.direction,
            date_raw: t.date_raw.clone(),
        })
        .collect()
}

/// Entries beyond the first per (date, amount, direction).
pub fn count_duplicates(transactions: &[Transaction]) -> usize {
    let mut seen = HashSet::new();
    transactions
        .iter()
        .filter(|t| !seen.insert((t.date_raw.as_deref(), t.amount.round_dp(2), t.direction)))
        .count()
}

pub fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    if raw.contains('-') {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    } else {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        NaiveDate::parse_from_str(&normalized, "%d %b %Y").ok()
    }
}

/// Transactions whose date (taken at midnight) lies after `now`.
pub fn count_future_dated(transactions: &[Transaction], now: NaiveDateTime) -> usize {
    transactions
        .iter()
        .filter_map(|t| t.date_raw.as_deref())
        .filter_map(parse_statement_date)
        .filter_map(|d| d.and_hms_opt(0, 0, 0))
        .filter(|dt| *dt > now)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rules() -> CompiledRules {
        CompiledRules::builtin().unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_lines_without_amount_skipped() {
        let text = "Statement\n\n   \nsalary 500.00\nPage 1 of 2\nref 12";
        let out = analyze_transactions(text, &rules(), now());
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].line, "salary 500.00");
    }

    #[test]
    fn test_direction_precedence() {
        let r = rules();
        // inbound keyword wins even with an outbound keyword present
        assert_eq!(classify_direction("salary debit order", dec!(10), &r), Direction::In);
        assert_eq!(classify_direction("ATM withdrawal", dec!(200), &r), Direction::Out);
        assert_eq!(classify_direction("transfer", dec!(5), &r), Direction::In);
        assert_eq!(classify_direction("transfer", dec!(-5), &r), Direction::Out);
        assert_eq!(classify_direction("transfer", dec!(0), &r), Direction::Out);
    }

    #[test]
    fn test_cr_marker_needs_trailing_space() {
        let r = rules();
        assert_eq!(classify_direction("ref cr 10.00", dec!(10), &r), Direction::In);
        assert_eq!(classify_direction("ref 10.00 dr", dec!(10), &r), Direction::Out);
    }

    #[test]
    fn test_totals_and_signs() {
        let text = "salary 1,500.00\nATM withdrawal -200.00\nfee 5.50\nrefund -10.00\ncredit -3.00";
        let out = analyze_transactions(text, &rules(), now());
        // "credit -3.00" is inbound but negative, so it is excluded from total_in
        assert_eq!(out.total_in, dec!(1500.00));
        // refund falls back to sign: out
        assert_eq!(out.total_out, dec!(215.50));
        assert!(out.total_in >= Decimal::ZERO && out.total_out >= Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_amount_dropped() {
        let line = "salary 50,000,000,000,000,000,000,000,000,000.00";
        let text = format!("{line}\n{line}\nfee 5.00");
        let out = analyze_transactions(&text, &rules(), now());
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.total_in, dec!(50000000000000000000000000000));
        assert_eq!(out.total_out, dec!(5.00));
        assert_eq!(out.duplicate_count, 0);
        assert_eq!(totals(&out.transactions), (out.total_in, out.total_out));
    }

    #[test]
    fn test_balance_anchor_lines_are_not_transactions() {
        let text = "Opening balance: 1,000.00\nsalary 500.00\nATM withdrawal 200.00\nClosing balance: 1,300.00";
        let out = analyze_transactions(text, &rules(), now());
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.total_in, dec!(500.00));
        assert_eq!(out.total_out, dec!(200.00));
    }

    #[test]
    fn test_malformed_amount_dropped() {
        let out = analyze_transactions("payment 1.2.50", &rules(), now());
        assert!(out.transactions.is_empty());
    }

    #[test]
    fn test_ranking_limit_order_and_ties() {
        let text = "a 10.00\nb 50.00\nc -50.00\nd 30.00\ne 20.00\nf 40.00\ng 1.00";
        let out = analyze_transactions(text, &rules(), now());
        let desc: Vec<&str> = out
            .important_transactions
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(desc, vec!["b 50.00", "c -50.00", "f 40.00", "d 30.00", "e 20.00"]);
    }

    #[test]
    fn test_ranking_shorter_than_limit() {
        let out = analyze_transactions("x 1.00\ny 2.00", &rules(), now());
        assert_eq!(out.important_transactions.len(), 2);
    }

    #[test]
    fn test_description_truncated() {
        let long = format!("{} 99.00", "x".repeat(250));
        let out = analyze_transactions(&long, &rules(), now());
        assert_eq!(out.important_transactions[0].description.chars().count(), 200);
    }

    #[test]
    fn test_duplicates_counted() {
        let text = "2024-01-05 POS Grocer 100.00\n2024-01-05 POS Grocer 100.00\n2024-01-05 POS Grocer 100.00\n2024-01-06 POS Grocer 100.00";
        let out = analyze_transactions(text, &rules(), now());
        assert_eq!(out.duplicate_count, 2);
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(
            parse_statement_date("01 Jan 2099"),
            NaiveDate::from_ymd_opt(2099, 1, 1)
        );
        assert_eq!(
            parse_statement_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse_statement_date("31 Foo 2024"), None);
        assert_eq!(parse_statement_date("2023-02-30"), None);
    }

    #[test]
    fn test_future_dated() {
        let text = "01 Jan 2099 salary 500.00\n2099-03-01 fee 5.00\n15 Jun 2024 deposit 20.00\nno date 3.00";
        let out = analyze_transactions(text, &rules(), now());
        assert_eq!(out.future_count, 2);
        assert_eq!(out.transactions.len(), 4);
        assert_eq!(out.transactions[3].date_raw, None);
    }

    #[test]
    fn test_today_is_not_future() {
        let out = analyze_transactions("30 Jun 2024 deposit 20.00", &rules(), now());
        assert_eq!(out.future_count, 0);
    }
}
