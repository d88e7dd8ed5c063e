//! Vesting schedule evaluation.
//!
//! A periodic schedule releases `initial_balance` in `num_periods` steps,
//! one at the end of each `period_duration` after `start_date`:
//!
//! ```text
//! elapsed  = floor((time - start_date) / period_duration), clamped to [0, num_periods]
//! unvested = initial_balance - floor(initial_balance × elapsed / num_periods)
//! ```
//!
//! Division truncates on the vested side, so rounding never releases more
//! than the holder is entitled to.

use {
    crate::{
        amount::Amount,
        error::{Result, StakeAccountingError},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Unix timestamp in seconds, as read from the on-chain clock.
pub type UnixTimestamp = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VestingSchedule {
    /// No tokens are ever unvested.
    FullyVested,
    PeriodicVesting {
        initial_balance: Amount,
        start_date: UnixTimestamp,
        period_duration: u64,
        num_periods: u64,
    },
    /// Periodic vesting whose clock starts when the token lists. Until the
    /// listing time is known the whole balance stays unvested.
    PeriodicVestingAfterListing {
        initial_balance: Amount,
        period_duration: u64,
        num_periods: u64,
        #[serde(default)]
        listing_time: Option<UnixTimestamp>,
    },
}

/// The next point at which unvested tokens decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingEvent {
    pub amount: Amount,
    pub time: UnixTimestamp,
}

/// Parameters of a schedule whose start time is known.
struct Periodic {
    initial_balance: Amount,
    start_date: UnixTimestamp,
    period_duration: u64,
    num_periods: u64,
}

impl Periodic {
    /// Periods fully elapsed at `time`, clamped to `num_periods`.
    fn elapsed_periods(&self, time: UnixTimestamp) -> Result<u64> {
        if time < self.start_date {
            return Ok(0);
        }
        let since_start = time
            .checked_sub(self.start_date)
            .and_then(|seconds| u64::try_from(seconds).ok())
            .ok_or(StakeAccountingError::ArithmeticOverflow)?;
        let elapsed = since_start
            .checked_div(self.period_duration)
            .ok_or_else(zero_period)?;
        Ok(elapsed.min(self.num_periods))
    }

    fn unvested_after(&self, elapsed_periods: u64) -> Result<Amount> {
        if elapsed_periods >= self.num_periods {
            return Ok(Amount::ZERO);
        }
        let vested = self
            .initial_balance
            .mul_div_floor(elapsed_periods, self.num_periods)?;
        self.initial_balance.checked_sub(vested)
    }

    fn boundary_time(&self, period: u64) -> Result<UnixTimestamp> {
        let offset = period
            .checked_mul(self.period_duration)
            .and_then(|seconds| i64::try_from(seconds).ok())
            .ok_or(StakeAccountingError::ArithmeticOverflow)?;
        self.start_date
            .checked_add(offset)
            .ok_or(StakeAccountingError::ArithmeticOverflow)
    }

    fn next_event(&self, time: UnixTimestamp) -> Result<Option<VestingEvent>> {
        let elapsed = self.elapsed_periods(time)?;
        let unvested = self.unvested_after(elapsed)?;
        if unvested.is_zero() {
            return Ok(None);
        }

        // Smallest period boundary j > elapsed where the vested amount grows:
        // initial × j ≥ (vested + 1 unit) × num.
        let initial = u128::from(self.initial_balance.units());
        let num = u128::from(self.num_periods);
        let vested = initial
            .checked_sub(u128::from(unvested.units()))
            .ok_or(StakeAccountingError::ArithmeticUnderflow)?;
        let needed = vested
            .checked_add(1)
            .and_then(|v| v.checked_mul(num))
            .ok_or(StakeAccountingError::ArithmeticOverflow)?;
        let next_period = needed
            .checked_add(initial.saturating_sub(1))
            .and_then(|v| v.checked_div(initial))
            .and_then(|j| u64::try_from(j).ok())
            .ok_or(StakeAccountingError::ArithmeticOverflow)?
            .max(elapsed.saturating_add(1))
            .min(self.num_periods);

        let after = self.unvested_after(next_period)?;
        Ok(Some(VestingEvent {
            amount: unvested.checked_sub(after)?,
            time: self.boundary_time(next_period)?,
        }))
    }
}

fn zero_period() -> StakeAccountingError {
    StakeAccountingError::InvalidVestingSchedule {
        reason: "period_duration must be > 0".to_string(),
    }
}

impl VestingSchedule {
    pub fn validate(&self) -> Result<()> {
        let (period_duration, num_periods) = match self {
            VestingSchedule::FullyVested => return Ok(()),
            VestingSchedule::PeriodicVesting {
                period_duration,
                num_periods,
                ..
            }
            | VestingSchedule::PeriodicVestingAfterListing {
                period_duration,
                num_periods,
                ..
            } => (*period_duration, *num_periods),
        };
        if period_duration == 0 {
            return Err(zero_period());
        }
        if num_periods == 0 {
            return Err(StakeAccountingError::InvalidVestingSchedule {
                reason: "num_periods must be > 0".to_string(),
            });
        }
        if i64::try_from(period_duration).is_err() {
            return Err(StakeAccountingError::InvalidVestingSchedule {
                reason: format!("period_duration ({period_duration}) does not fit a timestamp"),
            });
        }
        Ok(())
    }

    /// `None` for schedules with nothing left to vest on a known clock.
    fn periodic(&self) -> Result<Option<Periodic>> {
        self.validate()?;
        Ok(match *self {
            VestingSchedule::FullyVested => None,
            VestingSchedule::PeriodicVesting {
                initial_balance,
                start_date,
                period_duration,
                num_periods,
            } => Some(Periodic {
                initial_balance,
                start_date,
                period_duration,
                num_periods,
            }),
            VestingSchedule::PeriodicVestingAfterListing {
                initial_balance,
                period_duration,
                num_periods,
                listing_time,
            } => listing_time.map(|start_date| Periodic {
                initial_balance,
                start_date,
                period_duration,
                num_periods,
            }),
        })
    }

    /// Tokens still unvested at `time`.
    pub fn unvested_balance(&self, time: UnixTimestamp) -> Result<Amount> {
        match (self, self.periodic()?) {
            (_, Some(periodic)) => periodic.unvested_after(periodic.elapsed_periods(time)?),
            (VestingSchedule::PeriodicVestingAfterListing { initial_balance, .. }, None) => {
                Ok(*initial_balance)
            }
            (_, None) => Ok(Amount::ZERO),
        }
    }

    /// The next boundary strictly after `time` at which the unvested balance
    /// decreases, and by how much. `None` once fully vested, or while a
    /// listing-gated schedule has no listing time.
    pub fn next_vesting_event(&self, time: UnixTimestamp) -> Result<Option<VestingEvent>> {
        match self.periodic()? {
            Some(periodic) => periodic.next_event(time),
            None => Ok(None),
        }
    }
}
