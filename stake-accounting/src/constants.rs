//! Fixed-point, epoch and capacity constants for the accounting engine.

/// Number of fractional decimal digits carried by an [`crate::Amount`].
pub const AMOUNT_DECIMALS: u32 = 6;

/// Units per whole token (`10^AMOUNT_DECIMALS`).
pub const AMOUNT_SCALE: u64 = 1_000_000;

/// Fixed number of position slots in a stake account.
pub const MAX_POSITIONS: usize = 20;

/// Seconds per day, used for schedule and epoch arithmetic in tests and tools.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Default epoch length: one week.
pub const DEFAULT_EPOCH_DURATION_SECONDS: u64 = 604_800;

/// Default cooldown: positions stay UNLOCKING for one full epoch.
pub const DEFAULT_UNLOCKING_DURATION_EPOCHS: u8 = 1;
