//! Positions and the fixed-capacity slot arena that holds them.

use {
    crate::{
        amount::Amount,
        constants::MAX_POSITIONS,
        error::{Result, StakeAccountingError},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
    std::fmt,
};

/// Epoch index: `floor(unix_timestamp / epoch_duration_seconds)`.
pub type Epoch = u64;

/// What a position's tokens are committed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Governance voting. Only these positions carry voter weight.
    Voting,
    /// Delegation to a publisher in the integrity pool.
    IntegrityPool { publisher: Pubkey },
}

impl Target {
    pub fn is_voting(&self) -> bool {
        matches!(self, Target::Voting)
    }
}

/// Lockup lifecycle of a position at a given epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    Unlocked,
    Locking,
    Locked,
    PreUnlocking,
    Unlocking,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PositionState::Unlocked => "UNLOCKED",
            PositionState::Locking => "LOCKING",
            PositionState::Locked => "LOCKED",
            PositionState::PreUnlocking => "PREUNLOCKING",
            PositionState::Unlocking => "UNLOCKING",
        };
        f.write_str(name)
    }
}

/// A discrete amount of tokens committed to one target.
///
/// The lockup state is never stored: it is derived from
/// `(activation_epoch, unlocking_start, current_epoch, unlocking_duration)`
/// by a [`crate::oracle::PositionOracle`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Position {
    pub amount: Amount,
    /// First epoch in which the position counts as LOCKED.
    pub activation_epoch: Epoch,
    /// First epoch of the UNLOCKING cooldown, once an unlock was requested.
    #[serde(default)]
    pub unlocking_start: Option<Epoch>,
    pub target: Target,
}

impl Position {
    pub fn new(amount: Amount, activation_epoch: Epoch, target: Target) -> Self {
        Self {
            amount,
            activation_epoch,
            unlocking_start: None,
            target,
        }
    }
}

/// Fixed arena of [`MAX_POSITIONS`] slots, indexed by slot number.
///
/// Slots never move: closing a position frees its slot, and new positions
/// take the lowest free slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(try_from = "Vec<Option<Position>>", into = "Vec<Option<Position>>")]
pub struct Positions {
    slots: [Option<Position>; MAX_POSITIONS],
}

impl Default for Positions {
    fn default() -> Self {
        Self {
            slots: [None; MAX_POSITIONS],
        }
    }
}

impl Positions {
    pub const fn capacity() -> usize {
        MAX_POSITIONS
    }

    pub fn get(&self, index: usize) -> Option<&Position> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Live positions with their slot index, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Position)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|position| (index, position)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn free_slots(&self) -> usize {
        MAX_POSITIONS.saturating_sub(self.len())
    }

    /// Place `position` in the lowest free slot and return its index.
    pub fn insert(&mut self, position: Position) -> Result<usize> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(StakeAccountingError::TooManyPositions {
                capacity: MAX_POSITIONS,
            })?;
        *slot = Some(position);
        Ok(index)
    }

    /// Overwrite the live position at `index`.
    pub fn replace(&mut self, index: usize, position: Position) -> Result<Position> {
        match self.slots.get_mut(index) {
            Some(Some(existing)) => Ok(std::mem::replace(existing, position)),
            _ => Err(StakeAccountingError::InvalidPositionIndex { index }),
        }
    }

    /// Free the slot at `index`, returning the position it held.
    pub fn remove(&mut self, index: usize) -> Result<Position> {
        self.slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(StakeAccountingError::InvalidPositionIndex { index })
    }
}

impl TryFrom<Vec<Option<Position>>> for Positions {
    type Error = StakeAccountingError;

    fn try_from(slots: Vec<Option<Position>>) -> Result<Self> {
        if slots.len() > MAX_POSITIONS {
            return Err(StakeAccountingError::TooManyPositions {
                capacity: MAX_POSITIONS,
            });
        }
        let mut positions = Positions::default();
        for (target, slot) in positions.slots.iter_mut().zip(slots) {
            *target = slot;
        }
        Ok(positions)
    }
}

impl From<Positions> for Vec<Option<Position>> {
    fn from(positions: Positions) -> Self {
        let last_live = positions
            .slots
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |index| index.saturating_add(1));
        positions.slots[..last_live].to_vec()
    }
}
