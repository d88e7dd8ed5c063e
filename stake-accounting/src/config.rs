use {
    crate::{
        constants::{DEFAULT_EPOCH_DURATION_SECONDS, DEFAULT_UNLOCKING_DURATION_EPOCHS},
        error::{Result, StakeAccountingError},
        position::Epoch,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Global epoch configuration shared by every stake account.
///
/// All lockup transitions happen on epoch boundaries:
///
/// ```text
/// epoch = floor(unix_timestamp / epoch_duration_seconds)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct EpochConfig {
    /// Length of one epoch in seconds.
    pub epoch_duration_seconds: u64,

    /// Number of epochs a position spends UNLOCKING before its tokens are
    /// free again.
    pub unlocking_duration_epochs: u8,
}

impl EpochConfig {
    /// Epoch containing `unix_timestamp`.
    pub fn epoch_at(&self, unix_timestamp: i64) -> Result<Epoch> {
        let seconds = u64::try_from(unix_timestamp)
            .map_err(|_| StakeAccountingError::InvalidTimestamp { unix_timestamp })?;
        seconds
            .checked_div(self.epoch_duration_seconds)
            .ok_or_else(|| StakeAccountingError::InvalidConfig {
                reason: "epoch_duration_seconds must be > 0".to_string(),
            })
    }

    /// First second of `epoch`.
    pub fn epoch_start(&self, epoch: Epoch) -> Result<i64> {
        epoch
            .checked_mul(self.epoch_duration_seconds)
            .and_then(|seconds| i64::try_from(seconds).ok())
            .ok_or(StakeAccountingError::ArithmeticOverflow)
    }
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            epoch_duration_seconds: DEFAULT_EPOCH_DURATION_SECONDS,
            unlocking_duration_epochs: DEFAULT_UNLOCKING_DURATION_EPOCHS,
        }
    }
}

/// Validate that an `EpochConfig` is usable.
pub fn validate_config(config: &EpochConfig) -> Result<()> {
    if config.epoch_duration_seconds == 0 {
        return Err(StakeAccountingError::InvalidConfig {
            reason: "epoch_duration_seconds must be > 0".to_string(),
        });
    }
    if i64::try_from(config.epoch_duration_seconds).is_err() {
        return Err(StakeAccountingError::InvalidConfig {
            reason: format!(
                "epoch_duration_seconds ({}) does not fit a unix timestamp",
                config.epoch_duration_seconds
            ),
        });
    }
    Ok(())
}
