//! Unlock selection.
//!
//! An unlock request is satisfied from LOCKED and LOCKING voting positions,
//! oldest activation first, so that fresh deposits cannot jump ahead of
//! long-held commitments. Every selected position is closed in full except
//! possibly the last, which covers only the remainder.

use {
    crate::{
        amount::Amount,
        error::{Result, StakeAccountingError},
        oracle::PositionOracle,
        position::{Epoch, PositionState, Positions},
    },
    log::*,
    serde::{Deserialize, Serialize},
};

/// One position to close, fully or partially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionClose {
    pub position_index: usize,
    pub amount_to_close: Amount,
    /// The whole position is closed and its slot can be freed.
    pub full: bool,
    /// State of the position when the plan was computed.
    pub state: PositionState,
}

/// Positions to close for one unlock request, computed against a single
/// snapshot. The submitting layer revalidates it against the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockPlan {
    pub requested: Amount,
    pub current_epoch: Epoch,
    pub closes: Vec<PositionClose>,
}

impl UnlockPlan {
    pub fn total(&self) -> Result<Amount> {
        Amount::checked_sum(self.closes.iter().map(|close| close.amount_to_close))
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

struct Candidate {
    index: usize,
    activation_epoch: Epoch,
    amount: Amount,
    state: PositionState,
}

fn unlock_candidates<O: PositionOracle + ?Sized>(
    oracle: &O,
    positions: &Positions,
    current_epoch: Epoch,
    unlocking_duration: u8,
) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for (index, position) in positions.iter() {
        if !oracle.is_voting(position) {
            continue;
        }
        let state = oracle.classify_position(position, current_epoch, unlocking_duration)?;
        if matches!(state, PositionState::Locked | PositionState::Locking) {
            candidates.push(Candidate {
                index,
                activation_epoch: position.activation_epoch,
                amount: position.amount,
                state,
            });
        }
    }
    // Stable: equal activation epochs keep slot order.
    candidates.sort_by_key(|candidate| candidate.activation_epoch);
    Ok(candidates)
}

/// Total of the voting positions an unlock request can draw from.
pub fn lockable_balance<O: PositionOracle + ?Sized>(
    oracle: &O,
    positions: &Positions,
    current_epoch: Epoch,
    unlocking_duration: u8,
) -> Result<Amount> {
    let candidates = unlock_candidates(oracle, positions, current_epoch, unlocking_duration)?;
    Amount::checked_sum(candidates.iter().map(|candidate| candidate.amount))
}

/// Select positions to close so that `requested` tokens start unlocking.
pub fn select_positions_to_close<O: PositionOracle + ?Sized>(
    oracle: &O,
    positions: &Positions,
    requested: Amount,
    current_epoch: Epoch,
    unlocking_duration: u8,
) -> Result<UnlockPlan> {
    let candidates = unlock_candidates(oracle, positions, current_epoch, unlocking_duration)?;
    let available = Amount::checked_sum(candidates.iter().map(|candidate| candidate.amount))?;
    if requested > available {
        warn!("unlock of {requested} requested with only {available} locked or locking");
        return Err(StakeAccountingError::InsufficientLockedBalance {
            requested,
            available,
        });
    }

    let mut remaining = requested;
    let mut closes = Vec::new();
    for candidate in candidates {
        if remaining.is_zero() {
            break;
        }
        let amount_to_close = remaining.min(candidate.amount);
        remaining = remaining.checked_sub(amount_to_close)?;
        closes.push(PositionClose {
            position_index: candidate.index,
            amount_to_close,
            full: amount_to_close == candidate.amount,
            state: candidate.state,
        });
    }

    let plan = UnlockPlan {
        requested,
        current_epoch,
        closes,
    };
    debug!("unlock plan for {requested} at epoch {current_epoch}: {:?}", plan.closes);
    Ok(plan)
}
