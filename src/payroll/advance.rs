use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{entity::sea_orm_active_enums::AdvanceStatus, error::{PayrollError, PayrollResult}};

/// Moves an advance out of `pending`
///
/// Approved and rejected advances are final.
pub fn transition(from: AdvanceStatus, to: AdvanceStatus) -> PayrollResult<AdvanceStatus> {
    match (from, to) {
        (AdvanceStatus::Pending, AdvanceStatus::Approved | AdvanceStatus::Rejected) => Ok(to),
        (AdvanceStatus::Pending, AdvanceStatus::Pending) => Err(PayrollError::validation("advance is already pending")),
        (from, _) => Err(PayrollError::TerminalState(format!("advance is already {}", status_name(from)))),
    }
}

fn status_name(status: AdvanceStatus) -> &'static str {
    match status {
        AdvanceStatus::Pending => "pending",
        AdvanceStatus::Approved => "approved",
        AdvanceStatus::Rejected => "rejected",
    }
}

/// What a staff member may still draw: earned incentives minus what was already paid out
pub fn claimable_balance(earned: Decimal, paid_out: Decimal) -> Decimal {
    (earned - paid_out).max(Decimal::ZERO)
}

/// Lifetime totals of one staff member's incentives and advances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceLedger {
    /// Incentives earned
    pub earned: Decimal,
    /// Approved advances
    pub paid_out: Decimal,
    /// Requests still waiting for a decision, reserved against the balance
    pub pending: Decimal,
}

impl AdvanceLedger {
    pub fn claimable(&self) -> Decimal {
        claimable_balance(self.earned, self.paid_out + self.pending)
    }

    /// Balance left for approving one more request; pending ones only count once approved
    pub fn approvable(&self) -> Decimal {
        claimable_balance(self.earned, self.paid_out)
    }
}

/// Checks an advance request against the claimable balance; partial claims are fine
pub fn validate_request(amount: Decimal, balance: Decimal) -> PayrollResult<()> {
    if amount <= Decimal::ZERO {
        return Err(PayrollError::validation("advance amount must be positive"));
    }

    if amount > balance {
        return Err(PayrollError::validation(format!("advance of {amount} exceeds claimable balance of {balance}")));
    }

    Ok(())
}
