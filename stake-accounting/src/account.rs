//! Stake account state and the ledger primitives that mutate it.
//!
//! These primitives mirror what the on-chain program does to an account.
//! They do not check balances against vesting or lockup rules; callers go
//! through [`crate::engine::StakeAccountingEngine`] for that.

use {
    crate::{
        amount::Amount,
        error::{Result, StakeAccountingError},
        oracle::PositionOracle,
        position::{Epoch, Position, PositionState, Positions, Target},
        unlock::UnlockPlan,
        vesting::VestingSchedule,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeAccount {
    pub owner: Pubkey,
    /// Tokens held in custody. Every reconciled category sums to this.
    pub custody_balance: Amount,
    #[serde(default)]
    pub positions: Positions,
    pub vesting_schedule: VestingSchedule,
}

impl StakeAccount {
    pub fn new(owner: Pubkey, vesting_schedule: VestingSchedule) -> Self {
        Self {
            owner,
            custody_balance: Amount::ZERO,
            positions: Positions::default(),
            vesting_schedule,
        }
    }

    pub fn deposit(&mut self, amount: Amount) -> Result<()> {
        self.custody_balance = self.custody_balance.checked_add(amount)?;
        Ok(())
    }

    /// Remove tokens from custody.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        self.custody_balance = self.custody_balance.checked_sub(amount).map_err(|_| {
            StakeAccountingError::InsufficientWithdrawableBalance {
                requested: amount,
                available: self.custody_balance,
            }
        })?;
        Ok(())
    }

    /// Commit `amount` to `target`. The position is LOCKING until the next
    /// epoch starts.
    pub fn open_position(
        &mut self,
        target: Target,
        amount: Amount,
        current_epoch: Epoch,
    ) -> Result<usize> {
        let activation_epoch = current_epoch
            .checked_add(1)
            .ok_or(StakeAccountingError::ArithmeticOverflow)?;
        let index = self
            .positions
            .insert(Position::new(amount, activation_epoch, target))?;
        debug!("opened position {index}: {amount} activating at epoch {activation_epoch}");
        Ok(index)
    }

    /// Execute an unlock plan.
    ///
    /// LOCKING tokens are released immediately. LOCKED tokens enter their
    /// cooldown at the next epoch; a partial close splits the position.
    /// Either every close applies or the account is left untouched.
    pub fn apply_unlock_plan(&mut self, plan: &UnlockPlan) -> Result<()> {
        let unlocking_start = plan
            .current_epoch
            .checked_add(1)
            .ok_or(StakeAccountingError::ArithmeticOverflow)?;
        let mut positions = self.positions.clone();

        for close in &plan.closes {
            let index = close.position_index;
            let position = *positions
                .get(index)
                .ok_or(StakeAccountingError::InvalidPositionIndex { index })?;
            let remaining = position.amount.checked_sub(close.amount_to_close).map_err(|_| {
                StakeAccountingError::InsufficientLockedBalance {
                    requested: close.amount_to_close,
                    available: position.amount,
                }
            })?;

            match close.state {
                PositionState::Locking if remaining.is_zero() => {
                    positions.remove(index)?;
                }
                PositionState::Locking => {
                    positions.replace(
                        index,
                        Position {
                            amount: remaining,
                            ..position
                        },
                    )?;
                }
                PositionState::Locked if remaining.is_zero() => {
                    positions.replace(
                        index,
                        Position {
                            unlocking_start: Some(unlocking_start),
                            ..position
                        },
                    )?;
                }
                PositionState::Locked => {
                    positions.replace(
                        index,
                        Position {
                            amount: remaining,
                            ..position
                        },
                    )?;
                    positions.insert(Position {
                        amount: close.amount_to_close,
                        unlocking_start: Some(unlocking_start),
                        ..position
                    })?;
                }
                state => {
                    warn!("position {index} is {state}, cannot close");
                    return Err(StakeAccountingError::InsufficientLockedBalance {
                        requested: close.amount_to_close,
                        available: Amount::ZERO,
                    });
                }
            }
        }

        self.positions = positions;
        Ok(())
    }

    /// Free the slots of positions whose cooldown has ended. Returns the
    /// freed slot indices.
    pub fn close_unlocked_positions<O: PositionOracle + ?Sized>(
        &mut self,
        oracle: &O,
        current_epoch: Epoch,
        unlocking_duration: u8,
    ) -> Result<Vec<usize>> {
        let mut expired = Vec::new();
        for (index, position) in self.positions.iter() {
            if oracle.classify_position(position, current_epoch, unlocking_duration)?
                == PositionState::Unlocked
            {
                expired.push(index);
            }
        }
        for &index in &expired {
            self.positions.remove(index)?;
        }
        Ok(expired)
    }
}
