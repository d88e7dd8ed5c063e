//! Position classification.
//!
//! The engine never decides lockup state on its own: it asks an injected
//! [`PositionOracle`]. [`EpochPositionOracle`] is the stateless default that
//! derives the state from epochs alone, matching the on-chain program.

use {
    crate::{
        amount::Amount,
        error::Result,
        position::{Epoch, Position, PositionState, Positions},
        summary::LockedBalanceSummary,
    },
    log::*,
};

pub trait PositionOracle {
    /// Lockup state of `position` at `current_epoch`.
    fn classify_position(
        &self,
        position: &Position,
        current_epoch: Epoch,
        unlocking_duration: u8,
    ) -> Result<PositionState>;

    /// Whether the position contributes to governance weight.
    fn is_voting(&self, position: &Position) -> bool {
        position.target.is_voting()
    }

    /// Per-state totals over every live position. UNLOCKED positions count
    /// towards no category.
    fn aggregate_locked_summary(
        &self,
        positions: &Positions,
        current_epoch: Epoch,
        unlocking_duration: u8,
    ) -> Result<LockedBalanceSummary> {
        let mut summary = LockedBalanceSummary::default();
        for (index, position) in positions.iter() {
            let state = self.classify_position(position, current_epoch, unlocking_duration)?;
            trace!("position {index}: {} tokens {state} at epoch {current_epoch}", position.amount);
            summary.add(state, position.amount)?;
        }
        Ok(summary)
    }

    /// Voting tokens that count as locked at `epoch`: LOCKED, or PREUNLOCKING
    /// (still locked until the cooldown starts).
    fn locked_at_epoch(
        &self,
        positions: &Positions,
        epoch: Epoch,
        unlocking_duration: u8,
    ) -> Result<Amount> {
        let mut locked = Amount::ZERO;
        for (_, position) in positions.iter() {
            if !self.is_voting(position) {
                continue;
            }
            match self.classify_position(position, epoch, unlocking_duration)? {
                PositionState::Locked | PositionState::PreUnlocking => {
                    locked = locked.checked_add(position.amount)?;
                }
                PositionState::Locking | PositionState::Unlocking | PositionState::Unlocked => {}
            }
        }
        Ok(locked)
    }
}

/// Classifies positions purely from their epochs.
///
/// | condition                                               | state        |
/// |---------------------------------------------------------|--------------|
/// | `current < activation`                                  | LOCKING      |
/// | no unlock requested                                     | LOCKED       |
/// | `current < unlocking_start`                             | PREUNLOCKING |
/// | `current < unlocking_start + unlocking_duration`        | UNLOCKING    |
/// | otherwise                                               | UNLOCKED     |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpochPositionOracle;

impl PositionOracle for EpochPositionOracle {
    fn classify_position(
        &self,
        position: &Position,
        current_epoch: Epoch,
        unlocking_duration: u8,
    ) -> Result<PositionState> {
        if current_epoch < position.activation_epoch {
            return Ok(PositionState::Locking);
        }
        let Some(unlocking_start) = position.unlocking_start else {
            return Ok(PositionState::Locked);
        };
        if current_epoch < unlocking_start {
            return Ok(PositionState::PreUnlocking);
        }
        let unlocking_end = unlocking_start.saturating_add(u64::from(unlocking_duration));
        if current_epoch < unlocking_end {
            Ok(PositionState::Unlocking)
        } else {
            Ok(PositionState::Unlocked)
        }
    }
}
