//! Coarse classification of a vesting account, used to gate the high-level
//! lock and unlock operations.

use {
    crate::{
        error::{Result, StakeAccountingError},
        summary::UnvestedBalanceSummary,
    },
    log::*,
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VestingAccountState {
    FullyVested,
    UnvestedTokensFullyLocked,
    UnvestedTokensFullyLockedExceptCooldown,
    UnvestedTokensPartiallyLocked,
    UnvestedTokensFullyUnlockedExceptCooldown,
    UnvestedTokensFullyUnlocked,
}

impl fmt::Display for VestingAccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Derive the account state from the unvested categories of a reconciled
/// summary.
///
/// | total | locked+locking | unlocked | cooldown | state                         |
/// |-------|----------------|----------|----------|-------------------------------|
/// | 0     |                |          |          | FullyVested                   |
/// | > 0   | 0              |          | 0        | FullyUnlocked                 |
/// | > 0   | 0              |          | > 0      | FullyUnlockedExceptCooldown   |
/// | > 0   | > 0            | 0        | 0        | FullyLocked                   |
/// | > 0   | > 0            | 0        | > 0      | FullyLockedExceptCooldown     |
/// | > 0   | > 0            | > 0      |          | PartiallyLocked               |
pub fn classify(unvested: &UnvestedBalanceSummary) -> Result<VestingAccountState> {
    if unvested.total.is_zero() {
        return Ok(VestingAccountState::FullyVested);
    }
    let lockable = unvested.lockable()?;
    let cooldown = unvested.cooldown()?;
    let state = if lockable.is_zero() {
        if cooldown.is_zero() {
            VestingAccountState::UnvestedTokensFullyUnlocked
        } else {
            VestingAccountState::UnvestedTokensFullyUnlockedExceptCooldown
        }
    } else if unvested.unlocked.is_zero() {
        if cooldown.is_zero() {
            VestingAccountState::UnvestedTokensFullyLocked
        } else {
            VestingAccountState::UnvestedTokensFullyLockedExceptCooldown
        }
    } else {
        VestingAccountState::UnvestedTokensPartiallyLocked
    };
    Ok(state)
}

/// High-level operations gated on the vesting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VestingOperation {
    /// Lock every unlocked unvested token into governance.
    LockAllUnvested,
    /// Start unlocking every LOCKED and LOCKING voting position.
    UnlockAll,
    /// Start unlocking the amount that vests at the next vesting event, so it
    /// is free as soon as it vests.
    UnlockBeforeVestingEvent,
}

impl fmt::Display for VestingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl VestingOperation {
    pub fn legal_source_states(self) -> &'static [VestingAccountState] {
        use VestingAccountState::*;
        match self {
            VestingOperation::LockAllUnvested => {
                &[UnvestedTokensPartiallyLocked, UnvestedTokensFullyUnlocked]
            }
            VestingOperation::UnlockAll => &[
                UnvestedTokensFullyLocked,
                UnvestedTokensFullyLockedExceptCooldown,
                UnvestedTokensPartiallyLocked,
            ],
            VestingOperation::UnlockBeforeVestingEvent => &[
                UnvestedTokensFullyLocked,
                UnvestedTokensFullyLockedExceptCooldown,
            ],
        }
    }

    pub fn is_legal_from(self, state: VestingAccountState) -> bool {
        self.legal_source_states().contains(&state)
    }

    pub fn ensure_legal(self, state: VestingAccountState) -> Result<()> {
        if self.is_legal_from(state) {
            return Ok(());
        }
        warn!("{self} rejected in state {state}");
        Err(StakeAccountingError::IllegalStateTransition {
            operation: self.to_string(),
            state: state.to_string(),
        })
    }
}
