//! Property-based tests for unlock selection.
//!
//! Properties tested:
//! 1. A plan closes exactly the requested amount
//! 2. Positions are closed oldest activation first, all but the last in full
//! 3. Only LOCKED and LOCKING voting positions are ever closed
//! 4. Requests above the lockable balance are rejected
//! 5. Applying a plan moves tokens into cooldown without changing custody

#[cfg(test)]
mod tests {
    use {
        proptest::prelude::*,
        solana_pubkey::Pubkey,
        trv1_stake_accounting::{
            unlock::select_positions_to_close, Amount, EpochPositionOracle, Position,
            PositionOracle, PositionState, Positions, StakeAccount, StakeAccountingError,
            Target, VestingSchedule,
        },
    };

    const CURRENT_EPOCH: u64 = 100;
    const UNLOCKING_DURATION: u8 = 1;

    /// Positions of every kind at [`CURRENT_EPOCH`]: voting or integrity
    /// pool, LOCKING, LOCKED, or with an unlock already requested (so
    /// PREUNLOCKING, UNLOCKING or UNLOCKED).
    fn positions(max: usize) -> impl Strategy<Value = Positions> {
        let entry = (
            1..=1_000_000_000u64,
            0..=CURRENT_EPOCH + 2,
            prop::option::weighted(0.3, 0..=4u64),
            prop::bool::weighted(0.8),
            any::<u8>(),
        );
        prop::collection::vec(entry, 0..=max).prop_map(|entries| {
            let mut positions = Positions::default();
            for (units, activation_epoch, unlock_offset, voting, publisher) in entries {
                let target = if voting {
                    Target::Voting
                } else {
                    Target::IntegrityPool {
                        publisher: Pubkey::new_from_array([publisher; 32]),
                    }
                };
                let mut position =
                    Position::new(Amount::from_units(units), activation_epoch, target);
                if let Some(offset) = unlock_offset {
                    // An unlock is only requested once the position is active.
                    position.activation_epoch = activation_epoch.min(CURRENT_EPOCH - 2);
                    position.unlocking_start = Some(CURRENT_EPOCH - 2 + offset);
                }
                positions.insert(position).unwrap();
            }
            positions
        })
    }

    fn is_eligible(position: &Position) -> bool {
        let state = EpochPositionOracle
            .classify_position(position, CURRENT_EPOCH, UNLOCKING_DURATION)
            .unwrap();
        position.target.is_voting()
            && matches!(state, PositionState::Locked | PositionState::Locking)
    }

    fn lockable(positions: &Positions) -> Amount {
        Amount::checked_sum(
            positions
                .iter()
                .filter(|(_, position)| is_eligible(position))
                .map(|(_, position)| position.amount),
        )
        .unwrap()
    }

    fn custody(positions: &Positions) -> Amount {
        Amount::checked_sum(positions.iter().map(|(_, position)| position.amount)).unwrap()
    }

    fn fraction_of(amount: Amount, permille: u64) -> Amount {
        Amount::from_units((u128::from(amount.units()) * u128::from(permille) / 1_000) as u64)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1–3. Exact, FIFO and eligible only
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn plan_closes_exactly_the_request(
            positions in positions(20),
            permille in 0..=1_000u64,
        ) {
            let requested = fraction_of(lockable(&positions), permille);
            let plan = select_positions_to_close(
                &EpochPositionOracle, &positions, requested, CURRENT_EPOCH, UNLOCKING_DURATION,
            ).unwrap();

            prop_assert_eq!(plan.total().unwrap(), requested);
            prop_assert_eq!(plan.requested, requested);
            prop_assert!(plan.closes.iter().all(|close| !close.amount_to_close.is_zero()));
        }

        #[test]
        fn plan_is_fifo_over_eligible_positions(
            positions in positions(20),
            permille in 0..=1_000u64,
        ) {
            let requested = fraction_of(lockable(&positions), permille);
            let plan = select_positions_to_close(
                &EpochPositionOracle, &positions, requested, CURRENT_EPOCH, UNLOCKING_DURATION,
            ).unwrap();

            for close in &plan.closes {
                let position = positions.get(close.position_index).unwrap();
                prop_assert!(is_eligible(position), "closed ineligible {:?}", position);
                prop_assert!(close.amount_to_close <= position.amount);
            }

            let activation = |index: usize| positions.get(index).unwrap().activation_epoch;
            for pair in plan.closes.windows(2) {
                let earlier = activation(pair[0].position_index);
                let later = activation(pair[1].position_index);
                prop_assert!(
                    (earlier, pair[0].position_index) < (later, pair[1].position_index),
                    "close order not FIFO: {:?}", plan.closes
                );
                prop_assert!(pair[0].full);
            }

            // No skipped eligible position is older than the last one selected.
            if let Some(last) = plan.closes.last() {
                let newest_selected = activation(last.position_index);
                for (index, position) in positions.iter() {
                    let selected = plan.closes.iter().any(|close| close.position_index == index);
                    if !selected && is_eligible(position) {
                        prop_assert!(position.activation_epoch >= newest_selected);
                    }
                }
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. Over-requests
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn over_request_is_rejected(
            positions in positions(20),
            excess in 1..=1_000_000u64,
        ) {
            let available = lockable(&positions);
            let requested = available.checked_add(Amount::from_units(excess)).unwrap();
            let result = select_positions_to_close(
                &EpochPositionOracle, &positions, requested, CURRENT_EPOCH, UNLOCKING_DURATION,
            );
            prop_assert_eq!(
                result,
                Err(StakeAccountingError::InsufficientLockedBalance { requested, available })
            );
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 5. Applying a plan
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        /// One slot is kept free for the split of a partial close.
        #[test]
        fn applied_plan_moves_locked_tokens_into_cooldown(
            positions in positions(19),
            permille in 0..=1_000u64,
        ) {
            let oracle = EpochPositionOracle;
            let mut account =
                StakeAccount::new(Pubkey::new_from_array([5; 32]), VestingSchedule::FullyVested);
            account.positions = positions;
            account.deposit(custody(&account.positions)).unwrap();
            let custody_before = account.custody_balance;

            let eligible_before = lockable(&account.positions);
            let before = oracle
                .aggregate_locked_summary(&account.positions, CURRENT_EPOCH, UNLOCKING_DURATION)
                .unwrap();
            let requested = fraction_of(eligible_before, permille);
            let plan = select_positions_to_close(
                &oracle, &account.positions, requested, CURRENT_EPOCH, UNLOCKING_DURATION,
            ).unwrap();
            account.apply_unlock_plan(&plan).unwrap();
            let after = oracle
                .aggregate_locked_summary(&account.positions, CURRENT_EPOCH, UNLOCKING_DURATION)
                .unwrap();

            prop_assert_eq!(
                lockable(&account.positions).checked_add(requested).unwrap(),
                eligible_before
            );
            prop_assert!(after.preunlocking >= before.preunlocking);
            prop_assert_eq!(after.unlocking, before.unlocking);
            prop_assert!(after.total().unwrap() <= before.total().unwrap());
            prop_assert_eq!(account.custody_balance, custody_before);
        }
    }
}
