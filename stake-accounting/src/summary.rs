//! Balance reconciliation.
//!
//! The oracle classifies *all* custodied tokens by lockup state. Vesting
//! classifies some of the same tokens as unvested. Because vested and
//! unvested tokens are fungible inside a position, the reconciler attributes
//! part of each lockup category to the unvested pool so that nothing is
//! counted twice:
//!
//! ```text
//! withdrawable₀ = custody − (locking + locked + preunlocking + unlocking)
//! excess        = withdrawable₀ + locking + locked + preunlocking + unlocking
//!                 + unvested − custody
//! for category in [locked, locking, preunlocking, unlocking]:
//!     unvested.category = min(excess, category)
//!     excess           −= unvested.category
//! unvested.unlocked = unvested − Σ unvested.category
//! withdrawable      = withdrawable₀ − unvested.unlocked
//! ```
//!
//! The reported `locked` categories hold the vested remainder of each
//! category, so `withdrawable + locked.total() + unvested.total == custody`.

use {
    crate::{
        amount::Amount,
        error::{Result, StakeAccountingError},
        position::PositionState,
    },
    log::*,
    serde::{Deserialize, Serialize},
};

/// Token totals per lockup state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBalanceSummary {
    pub locking: Amount,
    pub locked: Amount,
    pub unlocking: Amount,
    pub preunlocking: Amount,
}

impl LockedBalanceSummary {
    /// Add `amount` to the category for `state`. UNLOCKED is not a category.
    pub fn add(&mut self, state: PositionState, amount: Amount) -> Result<()> {
        let category = match state {
            PositionState::Locking => &mut self.locking,
            PositionState::Locked => &mut self.locked,
            PositionState::PreUnlocking => &mut self.preunlocking,
            PositionState::Unlocking => &mut self.unlocking,
            PositionState::Unlocked => return Ok(()),
        };
        *category = category.checked_add(amount)?;
        Ok(())
    }

    pub fn total(&self) -> Result<Amount> {
        Amount::checked_sum([self.locking, self.locked, self.preunlocking, self.unlocking])
    }

    /// LOCKED plus LOCKING: what an unlock request can draw from.
    pub fn lockable(&self) -> Result<Amount> {
        self.locked.checked_add(self.locking)
    }

    /// PREUNLOCKING plus UNLOCKING: tokens in cooldown.
    pub fn cooldown(&self) -> Result<Amount> {
        self.preunlocking.checked_add(self.unlocking)
    }
}

/// The unvested share of each lockup category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnvestedBalanceSummary {
    pub total: Amount,
    pub locked: Amount,
    pub locking: Amount,
    pub unlocking: Amount,
    pub preunlocking: Amount,
    pub unlocked: Amount,
}

impl UnvestedBalanceSummary {
    pub fn lockable(&self) -> Result<Amount> {
        self.locked.checked_add(self.locking)
    }

    pub fn cooldown(&self) -> Result<Amount> {
        self.preunlocking.checked_add(self.unlocking)
    }
}

/// Fully reconciled view of a stake account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Vested tokens in no lockup: free to leave custody.
    pub withdrawable: Amount,
    /// Vested tokens per lockup category.
    pub locked: LockedBalanceSummary,
    pub unvested: UnvestedBalanceSummary,
}

impl BalanceSummary {
    /// All tokens (vested and unvested) per lockup category, as the oracle
    /// classified them.
    pub fn lockup_totals(&self) -> Result<LockedBalanceSummary> {
        Ok(LockedBalanceSummary {
            locking: self.locked.locking.checked_add(self.unvested.locking)?,
            locked: self.locked.locked.checked_add(self.unvested.locked)?,
            unlocking: self.locked.unlocking.checked_add(self.unvested.unlocking)?,
            preunlocking: self
                .locked
                .preunlocking
                .checked_add(self.unvested.preunlocking)?,
        })
    }

    /// Tokens in no lockup, vested or not.
    pub fn unlocked_total(&self) -> Result<Amount> {
        self.withdrawable.checked_add(self.unvested.unlocked)
    }

    /// Sum of every reconciled category. Equals the custody balance.
    pub fn total(&self) -> Result<Amount> {
        Amount::checked_sum([
            self.withdrawable,
            self.locked.total()?,
            self.unvested.total,
        ])
    }
}

/// Order in which lockup categories absorb the unvested pool.
///
/// Unvested tokens are assumed to sit in the most committed governance state
/// first. This is a policy constant kept for compatibility with existing
/// accounts.
pub const UNVESTED_ATTRIBUTION_ORDER: [PositionState; 4] = [
    PositionState::Locked,
    PositionState::Locking,
    PositionState::PreUnlocking,
    PositionState::Unlocking,
];

fn category(summary: &LockedBalanceSummary, state: PositionState) -> Amount {
    match state {
        PositionState::Locking => summary.locking,
        PositionState::Locked => summary.locked,
        PositionState::PreUnlocking => summary.preunlocking,
        PositionState::Unlocking => summary.unlocking,
        PositionState::Unlocked => Amount::ZERO,
    }
}

fn category_mut(summary: &mut LockedBalanceSummary, state: PositionState) -> Option<&mut Amount> {
    match state {
        PositionState::Locking => Some(&mut summary.locking),
        PositionState::Locked => Some(&mut summary.locked),
        PositionState::PreUnlocking => Some(&mut summary.preunlocking),
        PositionState::Unlocking => Some(&mut summary.unlocking),
        PositionState::Unlocked => None,
    }
}

fn violation(reason: String) -> StakeAccountingError {
    warn!("reconciliation invariant violated: {reason}");
    StakeAccountingError::invariant(reason)
}

/// Merge custody, vesting and lockup totals into one [`BalanceSummary`].
///
/// Fails with [`StakeAccountingError::ReconciliationInvariantViolation`] when
/// the inputs cannot describe the same account: more tokens locked, or more
/// unvested, than are in custody.
pub fn reconcile(
    custody_balance: Amount,
    unvested_total: Amount,
    locked_summary: &LockedBalanceSummary,
) -> Result<BalanceSummary> {
    let locked_total = locked_summary.total()?;
    let oracle_withdrawable = custody_balance.checked_sub(locked_total).map_err(|_| {
        violation(format!(
            "locked total {locked_total} exceeds custody balance {custody_balance}"
        ))
    })?;

    let mut excess = oracle_withdrawable
        .checked_add(locked_total)?
        .checked_add(unvested_total)?
        .checked_sub(custody_balance)?;

    let mut vested = *locked_summary;
    let mut unvested_shares = LockedBalanceSummary::default();
    for state in UNVESTED_ATTRIBUTION_ORDER {
        if excess.is_zero() {
            break;
        }
        let share = excess.min(category(locked_summary, state));
        excess = excess.checked_sub(share)?;
        if let Some(remainder) = category_mut(&mut vested, state) {
            *remainder = remainder.checked_sub(share)?;
        }
        unvested_shares.add(state, share)?;
    }

    let attributed = unvested_shares.total()?;
    let unvested_unlocked = unvested_total.checked_sub(attributed).map_err(|_| {
        violation(format!(
            "attributed {attributed} unvested tokens but only {unvested_total} are unvested"
        ))
    })?;
    let withdrawable = oracle_withdrawable
        .checked_sub(unvested_unlocked)
        .map_err(|_| {
            violation(format!(
                "unvested balance {unvested_total} exceeds custody balance {custody_balance}"
            ))
        })?;

    let summary = BalanceSummary {
        withdrawable,
        locked: vested,
        unvested: UnvestedBalanceSummary {
            total: unvested_total,
            locked: unvested_shares.locked,
            locking: unvested_shares.locking,
            unlocking: unvested_shares.unlocking,
            preunlocking: unvested_shares.preunlocking,
            unlocked: unvested_unlocked,
        },
    };
    check_invariants(&summary, custody_balance, locked_summary)?;
    debug!("reconciled custody {custody_balance}: {summary:?}");
    Ok(summary)
}

/// Verify the sum and subset invariants of a reconciled summary.
pub fn check_invariants(
    summary: &BalanceSummary,
    custody_balance: Amount,
    locked_summary: &LockedBalanceSummary,
) -> Result<()> {
    let total = summary.total()?;
    if total != custody_balance {
        return Err(violation(format!(
            "categories sum to {total} but custody balance is {custody_balance}"
        )));
    }

    let unvested = &summary.unvested;
    let parts = Amount::checked_sum([
        unvested.locked,
        unvested.locking,
        unvested.preunlocking,
        unvested.unlocking,
        unvested.unlocked,
    ])?;
    if parts != unvested.total {
        return Err(violation(format!(
            "unvested categories sum to {parts} but unvested total is {}",
            unvested.total
        )));
    }

    if summary.lockup_totals()? != *locked_summary {
        return Err(violation(format!(
            "vested and unvested shares do not recompose the lockup totals {locked_summary:?}"
        )));
    }
    Ok(())
}
