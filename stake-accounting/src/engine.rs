//! Stake accounting engine.
//!
//! Every read operation is a pure function of one consistent snapshot (an
//! account plus a clock, and for voter weight a [`LedgerReader`]). The engine
//! holds no account state between calls, so one instance can be shared by
//! any number of evaluations.

use {
    crate::{
        account::StakeAccount,
        amount::Amount,
        config::{validate_config, EpochConfig},
        error::{Result, StakeAccountingError},
        ledger::LedgerReader,
        oracle::{EpochPositionOracle, PositionOracle},
        position::{Epoch, Target},
        summary::{reconcile, BalanceSummary, LockedBalanceSummary},
        unlock::{lockable_balance, select_positions_to_close, UnlockPlan},
        vesting::{UnixTimestamp, VestingEvent, VestingSchedule},
        vesting_state::{classify, VestingAccountState, VestingOperation},
        voter_weight::voter_weight,
    },
    log::*,
};

#[derive(Debug, Clone)]
pub struct StakeAccountingEngine<O: PositionOracle = EpochPositionOracle> {
    config: EpochConfig,
    oracle: O,
}

impl StakeAccountingEngine<EpochPositionOracle> {
    pub fn new(config: EpochConfig) -> Result<Self> {
        Self::with_oracle(config, EpochPositionOracle)
    }
}

impl<O: PositionOracle> StakeAccountingEngine<O> {
    pub fn with_oracle(config: EpochConfig, oracle: O) -> Result<Self> {
        validate_config(&config)?;
        Ok(Self { config, oracle })
    }

    pub fn config(&self) -> &EpochConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Oracle totals per lockup state, vested and unvested alike.
    pub fn get_locked_summary(
        &self,
        account: &StakeAccount,
        time: UnixTimestamp,
    ) -> Result<LockedBalanceSummary> {
        let epoch = self.config.epoch_at(time)?;
        self.oracle.aggregate_locked_summary(
            &account.positions,
            epoch,
            self.config.unlocking_duration_epochs,
        )
    }

    pub fn get_balance_summary(
        &self,
        account: &StakeAccount,
        time: UnixTimestamp,
    ) -> Result<BalanceSummary> {
        let locked_summary = self.get_locked_summary(account, time)?;
        let unvested = account.vesting_schedule.unvested_balance(time)?;
        reconcile(account.custody_balance, unvested, &locked_summary)
    }

    pub fn get_vesting_account_state(
        &self,
        account: &StakeAccount,
        time: UnixTimestamp,
    ) -> Result<VestingAccountState> {
        let summary = self.get_balance_summary(account, time)?;
        classify(&summary.unvested)
    }

    pub fn select_unlock_plan(
        &self,
        account: &StakeAccount,
        amount: Amount,
        time: UnixTimestamp,
    ) -> Result<UnlockPlan> {
        let epoch = self.config.epoch_at(time)?;
        select_positions_to_close(
            &self.oracle,
            &account.positions,
            amount,
            epoch,
            self.config.unlocking_duration_epochs,
        )
    }

    /// Governance weight of `account` at `epoch`. The network total and the
    /// supply come from the same ledger read.
    pub fn get_voter_weight<L: LedgerReader + ?Sized>(
        &self,
        account: &StakeAccount,
        ledger: &L,
        epoch: Epoch,
    ) -> Result<Amount> {
        let account_locked = self.oracle.locked_at_epoch(
            &account.positions,
            epoch,
            self.config.unlocking_duration_epochs,
        )?;
        let network_locked = ledger.total_network_locked_at(epoch)?;
        let total_supply = ledger.total_supply();
        let weight = voter_weight(account_locked, network_locked, total_supply)?;
        debug!(
            "voter weight at epoch {epoch}: {account_locked} of {network_locked} locked, \
             weight {weight}"
        );
        Ok(weight)
    }

    pub fn get_next_vesting_event(
        &self,
        schedule: &VestingSchedule,
        time: UnixTimestamp,
    ) -> Result<Option<VestingEvent>> {
        schedule.next_vesting_event(time)
    }

    /// Unvested tokens that are in no lockup and would be locked by
    /// [`VestingOperation::LockAllUnvested`].
    pub fn plan_lock_all_unvested(
        &self,
        account: &StakeAccount,
        time: UnixTimestamp,
    ) -> Result<Amount> {
        let summary = self.get_balance_summary(account, time)?;
        VestingOperation::LockAllUnvested.ensure_legal(classify(&summary.unvested)?)?;
        Ok(summary.unvested.unlocked)
    }

    /// Plan to start unlocking every LOCKED and LOCKING voting position.
    pub fn plan_unlock_all(
        &self,
        account: &StakeAccount,
        time: UnixTimestamp,
    ) -> Result<UnlockPlan> {
        let summary = self.get_balance_summary(account, time)?;
        VestingOperation::UnlockAll.ensure_legal(classify(&summary.unvested)?)?;
        let epoch = self.config.epoch_at(time)?;
        let duration = self.config.unlocking_duration_epochs;
        let requested = lockable_balance(&self.oracle, &account.positions, epoch, duration)?;
        select_positions_to_close(&self.oracle, &account.positions, requested, epoch, duration)
    }

    /// Plan to unlock what vests at the next vesting event, so those tokens
    /// are free once they vest. Unvested tokens already in cooldown count
    /// towards the amount. Empty when no event is scheduled.
    pub fn plan_unlock_before_vesting_event(
        &self,
        account: &StakeAccount,
        time: UnixTimestamp,
    ) -> Result<UnlockPlan> {
        let summary = self.get_balance_summary(account, time)?;
        VestingOperation::UnlockBeforeVestingEvent.ensure_legal(classify(&summary.unvested)?)?;
        let epoch = self.config.epoch_at(time)?;
        let Some(event) = account.vesting_schedule.next_vesting_event(time)? else {
            return Ok(UnlockPlan {
                requested: Amount::ZERO,
                current_epoch: epoch,
                closes: Vec::new(),
            });
        };

        let duration = self.config.unlocking_duration_epochs;
        let in_cooldown = summary.unvested.cooldown()?;
        let needed = if in_cooldown >= event.amount {
            Amount::ZERO
        } else {
            event.amount.checked_sub(in_cooldown)?
        };
        let lockable = lockable_balance(&self.oracle, &account.positions, epoch, duration)?;
        let requested = needed.min(lockable);
        debug!(
            "vesting event of {} at {}: {in_cooldown} already in cooldown, unlocking {requested}",
            event.amount, event.time
        );
        select_positions_to_close(&self.oracle, &account.positions, requested, epoch, duration)
    }

    /// Verify that `amount` can leave custody. Returns the summary the check
    /// was made against.
    pub fn check_withdrawal(
        &self,
        account: &StakeAccount,
        amount: Amount,
        time: UnixTimestamp,
    ) -> Result<BalanceSummary> {
        let summary = self.get_balance_summary(account, time)?;
        if amount > summary.withdrawable {
            warn!("withdrawal of {amount} exceeds withdrawable {}", summary.withdrawable);
            return Err(StakeAccountingError::InsufficientWithdrawableBalance {
                requested: amount,
                available: summary.withdrawable,
            });
        }
        Ok(summary)
    }

    /// Open a position for `amount` tokens in no lockup, vested or not.
    /// Returns the slot index.
    pub fn lock(
        &self,
        account: &mut StakeAccount,
        target: Target,
        amount: Amount,
        time: UnixTimestamp,
    ) -> Result<usize> {
        let summary = self.get_balance_summary(account, time)?;
        let available = summary.unlocked_total()?;
        if amount > available {
            warn!("lock of {amount} exceeds unlocked balance {available}");
            return Err(StakeAccountingError::InsufficientWithdrawableBalance {
                requested: amount,
                available,
            });
        }
        let epoch = self.config.epoch_at(time)?;
        account.open_position(target, amount, epoch)
    }

    /// Select and apply an unlock of `amount` tokens.
    pub fn unlock(
        &self,
        account: &mut StakeAccount,
        amount: Amount,
        time: UnixTimestamp,
    ) -> Result<UnlockPlan> {
        let plan = self.select_unlock_plan(account, amount, time)?;
        account.apply_unlock_plan(&plan)?;
        Ok(plan)
    }

    pub fn withdraw(
        &self,
        account: &mut StakeAccount,
        amount: Amount,
        time: UnixTimestamp,
    ) -> Result<()> {
        self.check_withdrawal(account, amount, time)?;
        account.debit(amount)
    }
}
