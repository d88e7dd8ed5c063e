use {
    crate::{amount::Amount, position::Epoch},
    thiserror::Error,
};

pub type Result<T> = std::result::Result<T, StakeAccountingError>;

/// Errors produced by the stake accounting engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeAccountingError {
    /// A token amount string could not be parsed.
    #[error("Invalid amount '{input}': {reason}")]
    ParseError { input: String, reason: String },

    /// An unlock request exceeds what is currently LOCKED or LOCKING.
    #[error("Insufficient locked balance: requested {requested}, locked or locking {available}")]
    InsufficientLockedBalance { requested: Amount, available: Amount },

    /// A withdrawal or lock request exceeds the free balance.
    #[error("Insufficient withdrawable balance: requested {requested}, available {available}")]
    InsufficientWithdrawableBalance { requested: Amount, available: Amount },

    /// The requested high-level operation is not valid from the account's
    /// current vesting state.
    #[error("{operation} is not allowed while the account is in state {state}")]
    IllegalStateTransition { operation: String, state: String },

    /// The categories of a summary do not add up to the custody balance.
    /// Inputs are inconsistent (stale snapshot) or there is a logic defect.
    #[error("Reconciliation invariant violated: {reason}")]
    ReconciliationInvariantViolation { reason: String },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Arithmetic underflow")]
    ArithmeticUnderflow,

    #[error("Invalid epoch configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid vesting schedule: {reason}")]
    InvalidVestingSchedule { reason: String },

    #[error("Timestamp {unix_timestamp} precedes the epoch origin")]
    InvalidTimestamp { unix_timestamp: i64 },

    #[error("All {capacity} position slots are in use")]
    TooManyPositions { capacity: usize },

    #[error("No live position at slot {index}")]
    InvalidPositionIndex { index: usize },

    /// The ledger snapshot does not carry totals for the requested epoch.
    #[error("Ledger snapshot has no network locked total for epoch {epoch}")]
    MissingEpochSnapshot { epoch: Epoch },
}

impl StakeAccountingError {
    /// Fatal errors must abort the caller's operation: the numbers that
    /// produced them cannot be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ReconciliationInvariantViolation { .. }
                | Self::ArithmeticOverflow
                | Self::ArithmeticUnderflow
        )
    }

    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        Self::ReconciliationInvariantViolation {
            reason: reason.into(),
        }
    }
}
