//! Reads from the ledger.
//!
//! Every input of one evaluation must come from a single consistent read:
//! mixing a position set from one slot with a custody balance from another
//! breaks reconciliation. [`LedgerSnapshot`] captures such a read.

use {
    crate::{
        amount::Amount,
        error::{Result, StakeAccountingError},
        position::Epoch,
        vesting::UnixTimestamp,
    },
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

pub trait LedgerReader {
    /// On-chain clock. Deployments may run an accelerated mock clock, so this
    /// is never wall-clock time.
    fn unix_timestamp(&self) -> UnixTimestamp;

    fn total_supply(&self) -> Amount;

    /// Voting tokens locked across the whole network at `epoch`.
    fn total_network_locked_at(&self, epoch: Epoch) -> Result<Amount>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Slot the snapshot was read at.
    pub slot: u64,
    pub unix_timestamp: UnixTimestamp,
    pub total_supply: Amount,
    #[serde(default)]
    pub network_locked: BTreeMap<Epoch, Amount>,
}

impl LedgerReader for LedgerSnapshot {
    fn unix_timestamp(&self) -> UnixTimestamp {
        self.unix_timestamp
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn total_network_locked_at(&self, epoch: Epoch) -> Result<Amount> {
        self.network_locked
            .get(&epoch)
            .copied()
            .ok_or(StakeAccountingError::MissingEpochSnapshot { epoch })
    }
}
