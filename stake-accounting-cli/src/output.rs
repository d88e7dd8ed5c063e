use {
    serde::Serialize,
    std::fmt,
    trv1_stake_accounting::{
        Amount, BalanceSummary, Epoch, UnixTimestamp, UnlockPlan, VestingAccountState,
        VestingEvent,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Display,
    Json,
}

impl OutputFormat {
    pub fn from_matches_value(value: Option<&str>) -> Self {
        match value {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Display,
        }
    }

    pub fn formatted_string<T: Serialize + fmt::Display>(&self, item: &T) -> String {
        match self {
            OutputFormat::Display => format!("{item}"),
            OutputFormat::Json => {
                serde_json::to_string_pretty(item)
                    .unwrap_or_else(|err| format!("{{\"error\": \"{err}\"}}"))
            }
        }
    }
}

// ── Output Structs ──────────────────────────────────────────────────
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliBalanceSummary {
    pub unix_timestamp: UnixTimestamp,
    pub epoch: Epoch,
    pub custody_balance: Amount,
    #[serde(flatten)]
    pub summary: BalanceSummary,
}

impl fmt::Display for CliBalanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locked = &self.summary.locked;
        let unvested = &self.summary.unvested;
        writeln!(f, "Epoch {} (unix time {})", self.epoch, self.unix_timestamp)?;
        writeln!(f, "  Custody balance:    {}", self.custody_balance)?;
        writeln!(f, "  Withdrawable:       {}", self.summary.withdrawable)?;
        writeln!(f, "  Vested, by lockup state:")?;
        writeln!(f, "    Locking:          {}", locked.locking)?;
        writeln!(f, "    Locked:           {}", locked.locked)?;
        writeln!(f, "    Pre-unlocking:    {}", locked.preunlocking)?;
        writeln!(f, "    Unlocking:        {}", locked.unlocking)?;
        writeln!(f, "  Unvested:           {}", unvested.total)?;
        if !unvested.total.is_zero() {
            writeln!(f, "    Locking:          {}", unvested.locking)?;
            writeln!(f, "    Locked:           {}", unvested.locked)?;
            writeln!(f, "    Pre-unlocking:    {}", unvested.preunlocking)?;
            writeln!(f, "    Unlocking:        {}", unvested.unlocking)?;
            writeln!(f, "    Unlocked:         {}", unvested.unlocked)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliVestingState {
    pub state: VestingAccountState,
    pub next_vesting_event: Option<VestingEvent>,
}

impl fmt::Display for CliVestingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vesting state: {}", self.state)?;
        match &self.next_vesting_event {
            Some(event) => writeln!(
                f,
                "Next vesting: {} at unix time {}",
                event.amount, event.time
            ),
            None => writeln!(f, "No vesting event scheduled"),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct CliUnlockPlan {
    pub plan: UnlockPlan,
}

impl fmt::Display for CliUnlockPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Unlock of {} at epoch {}",
            self.plan.requested, self.plan.current_epoch
        )?;
        if self.plan.is_empty() {
            return writeln!(f, "Nothing to close.");
        }
        writeln!(f, "{:>6} {:>14} {:>24} {:>6}", "Slot", "State", "Amount", "Full")?;
        writeln!(f, "{}", "-".repeat(53))?;
        for close in &self.plan.closes {
            writeln!(
                f,
                "{:>6} {:>14} {:>24} {:>6}",
                close.position_index,
                close.state.to_string(),
                close.amount_to_close.to_string(),
                if close.full { "yes" } else { "no" }
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliVoterWeight {
    pub epoch: Epoch,
    pub voter_weight: Amount,
}

impl fmt::Display for CliVoterWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Voter weight at epoch {}: {}", self.epoch, self.voter_weight)
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliNextVestingEvent {
    pub next_vesting_event: Option<VestingEvent>,
}

impl fmt::Display for CliNextVestingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.next_vesting_event {
            Some(event) => writeln!(f, "{} vests at unix time {}", event.amount, event.time),
            None => writeln!(f, "No vesting event scheduled"),
        }
    }
}
