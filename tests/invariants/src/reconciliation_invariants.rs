//! Property-based tests for balance reconciliation.
//!
//! Properties tested:
//! 1. Every reconciled category sums to the custody balance
//! 2. Each unvested category is bounded by its lockup total
//! 3. Vested and unvested shares recompose the oracle totals
//! 4. Unvested tokens are attributed to LOCKED first
//! 5. Reconciliation is deterministic
//! 6. Summaries of generated accounts satisfy 1–3 at any time

#[cfg(test)]
mod tests {
    use {
        proptest::prelude::*,
        solana_pubkey::Pubkey,
        trv1_stake_accounting::{
            summary::{reconcile, LockedBalanceSummary},
            Amount, EpochConfig, Position, StakeAccount, StakeAccountingEngine,
            StakeAccountingError, Target, VestingSchedule,
        },
    };

    const MAX_CATEGORY: u64 = 1_000_000_000_000;

    /// Custody, unvested total and a lockup summary that fits inside custody.
    fn consistent_inputs() -> impl Strategy<Value = (Amount, Amount, LockedBalanceSummary)> {
        (
            0..=MAX_CATEGORY,
            0..=MAX_CATEGORY,
            0..=MAX_CATEGORY,
            0..=MAX_CATEGORY,
            0..=MAX_CATEGORY,
            0..=1_000u64,
        )
            .prop_map(|(free, locking, locked, preunlocking, unlocking, unvested_permille)| {
                let custody = free + locking + locked + preunlocking + unlocking;
                let unvested = (u128::from(custody) * u128::from(unvested_permille) / 1_000) as u64;
                (
                    Amount::from_units(custody),
                    Amount::from_units(unvested),
                    LockedBalanceSummary {
                        locking: Amount::from_units(locking),
                        locked: Amount::from_units(locked),
                        unlocking: Amount::from_units(unlocking),
                        preunlocking: Amount::from_units(preunlocking),
                    },
                )
            })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1–3. Sum, subset and recomposition
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn reconciled_categories_sum_to_custody(
            (custody, unvested, locked) in consistent_inputs(),
        ) {
            let summary = reconcile(custody, unvested, &locked).unwrap();

            prop_assert_eq!(summary.total().unwrap(), custody);
            prop_assert_eq!(
                summary.unlocked_total().unwrap().units()
                    + summary.lockup_totals().unwrap().total().unwrap().units(),
                custody.units()
            );
            prop_assert_eq!(summary.unvested.total, unvested);
        }

        #[test]
        fn unvested_categories_bounded_by_lockup_totals(
            (custody, unvested, locked) in consistent_inputs(),
        ) {
            let summary = reconcile(custody, unvested, &locked).unwrap();
            let totals = summary.lockup_totals().unwrap();

            prop_assert_eq!(totals, locked);
            prop_assert!(summary.unvested.locked <= totals.locked);
            prop_assert!(summary.unvested.locking <= totals.locking);
            prop_assert!(summary.unvested.preunlocking <= totals.preunlocking);
            prop_assert!(summary.unvested.unlocking <= totals.unlocking);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. Attribution order
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// A later category only absorbs unvested tokens once every earlier
        /// category is exhausted.
        #[test]
        fn unvested_fills_locked_before_other_categories(
            (custody, unvested, locked) in consistent_inputs(),
        ) {
            let summary = reconcile(custody, unvested, &locked).unwrap();
            let shares = &summary.unvested;

            if !shares.locking.is_zero() {
                prop_assert_eq!(shares.locked, locked.locked);
            }
            if !shares.preunlocking.is_zero() {
                prop_assert_eq!(shares.locking, locked.locking);
            }
            if !shares.unlocking.is_zero() {
                prop_assert_eq!(shares.preunlocking, locked.preunlocking);
            }
            if !shares.unlocked.is_zero() {
                prop_assert_eq!(shares.unlocking, locked.unlocking);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 5. Determinism and inconsistent snapshots
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn reconciliation_is_deterministic(
            (custody, unvested, locked) in consistent_inputs(),
        ) {
            prop_assert_eq!(
                reconcile(custody, unvested, &locked),
                reconcile(custody, unvested, &locked)
            );
        }

        #[test]
        fn locked_above_custody_is_rejected(
            locked in 1..=MAX_CATEGORY,
            shortfall in 1..=MAX_CATEGORY,
        ) {
            let custody = Amount::from_units(locked.saturating_sub(shortfall));
            let summary = LockedBalanceSummary {
                locked: Amount::from_units(locked),
                ..LockedBalanceSummary::default()
            };
            let result = reconcile(custody, Amount::ZERO, &summary);
            let is_violation = matches!(
                result,
                Err(StakeAccountingError::ReconciliationInvariantViolation { .. })
            );
            prop_assert!(is_violation);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 6. Generated accounts through the engine
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    const EPOCH_SECONDS: i64 = 604_800;

    /// An account whose positions and vesting schedule fit in custody, with
    /// some positions already unlocking.
    fn accounts() -> impl Strategy<Value = StakeAccount> {
        let position = (
            1..=1_000_000_000u64,
            0..=60u64,
            prop::option::weighted(0.3, 0..=30u64),
            prop::bool::weighted(0.8),
        );
        (
            prop::collection::vec(position, 0..=20),
            0..=1_000_000_000u64,
            0..=1_000u64,
            1..=5_000_000u64,
            1..=72u64,
        )
            .prop_map(|(entries, free, vested_permille, period_duration, num_periods)| {
                let mut account = StakeAccount::new(
                    Pubkey::new_from_array([8; 32]),
                    VestingSchedule::FullyVested,
                );
                for (units, activation_epoch, unlock_after, voting) in entries {
                    let target = if voting {
                        Target::Voting
                    } else {
                        Target::IntegrityPool {
                            publisher: Pubkey::new_from_array([1; 32]),
                        }
                    };
                    let mut position =
                        Position::new(Amount::from_units(units), activation_epoch, target);
                    position.unlocking_start = unlock_after.map(|after| activation_epoch + after);
                    account.positions.insert(position).unwrap();
                    account.deposit(Amount::from_units(units)).unwrap();
                }
                account.deposit(Amount::from_units(free)).unwrap();
                let initial = (u128::from(account.custody_balance.units())
                    * u128::from(vested_permille)
                    / 1_000) as u64;
                account.vesting_schedule = VestingSchedule::PeriodicVesting {
                    initial_balance: Amount::from_units(initial),
                    start_date: 0,
                    period_duration,
                    num_periods,
                };
                account
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn engine_summary_invariants_hold(
            account in accounts(),
            time in 0..=100 * EPOCH_SECONDS,
        ) {
            let engine = StakeAccountingEngine::new(EpochConfig::default()).unwrap();
            let summary = engine.get_balance_summary(&account, time).unwrap();
            let locked = engine.get_locked_summary(&account, time).unwrap();

            prop_assert_eq!(summary.total().unwrap(), account.custody_balance);
            prop_assert_eq!(summary.lockup_totals().unwrap(), locked);
            prop_assert_eq!(
                summary.unvested.total,
                account.vesting_schedule.unvested_balance(time).unwrap()
            );
            prop_assert!(summary.unvested.locked <= locked.locked);
            prop_assert!(summary.unvested.locking <= locked.locking);
            prop_assert!(summary.unvested.preunlocking <= locked.preunlocking);
            prop_assert!(summary.unvested.unlocking <= locked.unlocking);
            prop_assert_eq!(engine.get_balance_summary(&account, time).unwrap(), summary);
        }
    }
}
