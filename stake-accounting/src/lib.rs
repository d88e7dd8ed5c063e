//! # TRv1 Stake Accounting
//!
//! Position and vesting accounting for TRv1 governance staking.
//!
//! A stake account holds tokens in custody, commits them to **positions**
//! that move through epoch-aligned lockup states, and may carry a **vesting
//! schedule** restricting when tokens become freely disposable. This crate
//! answers, for one consistent ledger snapshot:
//!
//! * how much of the custody balance is withdrawable, locked per state, and
//!   unvested per state ([`summary`]),
//! * which positions to close, oldest first, to satisfy an unlock
//!   ([`unlock`]),
//! * which high-level vesting operations are currently legal
//!   ([`vesting_state`]),
//! * the account's governance voter weight ([`voter_weight`]).
//!
//! ## Quick start
//!
//! ```rust
//! use solana_pubkey::Pubkey;
//! use trv1_stake_accounting::{
//!     Amount, EpochConfig, StakeAccount, StakeAccountingEngine, Target, VestingSchedule,
//! };
//!
//! let engine = StakeAccountingEngine::new(EpochConfig::default()).unwrap();
//! let mut account =
//!     StakeAccount::new(Pubkey::new_from_array([7; 32]), VestingSchedule::FullyVested);
//! account.deposit("1,000".parse::<Amount>().unwrap()).unwrap();
//!
//! // Lock 600 tokens at epoch 0; they are LOCKING until epoch 1 starts.
//! engine.lock(&mut account, Target::Voting, "600".parse().unwrap(), 0).unwrap();
//!
//! let summary = engine.get_balance_summary(&account, 0).unwrap();
//! assert_eq!(summary.withdrawable.to_string(), "400");
//! assert_eq!(summary.locked.locking.to_string(), "600");
//! ```
//!
//! See [`engine`] for every exposed operation and [`config`] for tunables.

pub mod account;
pub mod amount;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod oracle;
pub mod position;
pub mod summary;
pub mod unlock;
pub mod vesting;
pub mod vesting_state;
pub mod voter_weight;


// Re-exports for convenience.
pub use {
    account::StakeAccount,
    amount::Amount,
    config::EpochConfig,
    engine::StakeAccountingEngine,
    error::{Result, StakeAccountingError},
    ledger::{LedgerReader, LedgerSnapshot},
    oracle::{EpochPositionOracle, PositionOracle},
    position::{Epoch, Position, PositionState, Positions, Target},
    summary::{BalanceSummary, LockedBalanceSummary, UnvestedBalanceSummary},
    unlock::{PositionClose, UnlockPlan},
    vesting::{UnixTimestamp, VestingEvent, VestingSchedule},
    vesting_state::{VestingAccountState, VestingOperation},
};
