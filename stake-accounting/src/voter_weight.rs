//! Governance voter weight.
//!
//! ```text
//! weight = floor(account_locked × total_supply / network_locked)
//! ```
//!
//! Numerator and denominator must be read at the same epoch; the engine
//! enforces that by taking both from one ledger snapshot.

use crate::{amount::Amount, error::Result};

/// Returns `0` when nothing is locked network-wide.
pub fn voter_weight(
    account_locked: Amount,
    network_locked: Amount,
    total_supply: Amount,
) -> Result<Amount> {
    if network_locked.is_zero() {
        return Ok(Amount::ZERO);
    }
    account_locked.mul_div_floor(total_supply.units(), network_locked.units())
}
