//! Snapshot files: one consistent ledger read serialized as JSON.

use {
    serde::{Deserialize, Serialize},
    std::{error, fs, path::Path},
    trv1_stake_accounting::{config::validate_config, EpochConfig, LedgerSnapshot, StakeAccount},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub config: EpochConfig,
    pub account: StakeAccount,
    pub ledger: LedgerSnapshot,
}

/// Command-line overrides applied on top of the snapshot's config.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub epoch_duration_seconds: Option<u64>,
    pub unlocking_duration_epochs: Option<u8>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|err| format!("Unable to read {}: {err}", path.display()))?;
        let snapshot = Self::from_json(&json)
            .map_err(|err| format!("Invalid snapshot {}: {err}", path.display()))?;
        Ok(snapshot)
    }

    pub fn effective_config(
        &self,
        overrides: ConfigOverrides,
    ) -> trv1_stake_accounting::Result<EpochConfig> {
        let config = EpochConfig {
            epoch_duration_seconds: overrides
                .epoch_duration_seconds
                .unwrap_or(self.config.epoch_duration_seconds),
            unlocking_duration_epochs: overrides
                .unlocking_duration_epochs
                .unwrap_or(self.config.unlocking_duration_epochs),
        };
        validate_config(&config)?;
        Ok(config)
    }
}
