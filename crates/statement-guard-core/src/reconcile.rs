use serde::{Deserialize, Serialize};

use crate::types::{Flag, Money, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// opening + total_in - total_out, rounded to 2 dp
    pub calculated_closing: Money,
    /// |calculated - stated closing|, rounded to 2 dp
    pub balance_difference: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<Flag>,
}

/// Check that the stated closing balance follows from the opening balance and
/// the aggregated flows. The tolerance test uses the unrounded difference.
///
/// Returns `None` when the arithmetic leaves the decimal range; the balances
/// are then treated as unusable, like missing anchors.
pub fn reconcile(
    opening: Money,
    closing: Money,
    total_in: Money,
    total_out: Money,
    tolerance: Money,
) -> Option<Reconciliation> {
    let expected = opening.checked_add(total_in)?.checked_sub(total_out)?;
    let difference = expected.checked_sub(closing)?.abs();

    let flag = (difference > tolerance).then(|| {
        Flag::new(
            "DOC_FAKE_BALANCE_FLOW",
            format!(
                "Balances do not reconcile with transactions (difference {}).",
                difference.round_dp(2)
            ),
            Severity::High,
        )
    });

    Some(Reconciliation {
        calculated_closing: expected.round_dp(2),
        balance_difference: difference.round_dp(2),
        flag,
    })
}
