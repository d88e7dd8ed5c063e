use {
    clap::{crate_description, crate_name, value_t, App, AppSettings, Arg, ArgMatches, SubCommand},
    log::*,
    std::{error, path::Path, process::exit},
    trv1_stake_accounting::{Amount, Epoch, LedgerReader, StakeAccountingEngine, UnixTimestamp},
};

mod output;
mod snapshot;

use {
    output::{
        CliBalanceSummary, CliNextVestingEvent, CliUnlockPlan, CliVestingState, CliVoterWeight,
        OutputFormat,
    },
    snapshot::{ConfigOverrides, Snapshot},
};

fn is_amount(value: String) -> Result<(), String> {
    value
        .parse::<Amount>()
        .map(|_| ())
        .map_err(|err| err.to_string())
}

fn is_parsable<T: std::str::FromStr>(value: String) -> Result<(), String> {
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|_| format!("Unable to parse '{value}'"))
}

fn app<'a>(version: &'a str) -> App<'a, 'a> {
    App::new(crate_name!())
        .about(crate_description!())
        .version(version)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("snapshot")
                .long("snapshot")
                .value_name("FILE")
                .takes_value(true)
                .global(true)
                .help("JSON snapshot holding the stake account and ledger read [required]"),
        )
        .arg(
            Arg::with_name("time")
                .long("time")
                .value_name("UNIX_TIMESTAMP")
                .takes_value(true)
                .global(true)
                .validator(is_parsable::<UnixTimestamp>)
                .help("Evaluate at this on-chain time [default: the snapshot's clock]"),
        )
        .arg(
            Arg::with_name("epoch_duration")
                .long("epoch-duration")
                .value_name("SECONDS")
                .takes_value(true)
                .global(true)
                .validator(is_parsable::<u64>)
                .help("Override the snapshot's epoch duration"),
        )
        .arg(
            Arg::with_name("unlocking_duration")
                .long("unlocking-duration")
                .value_name("EPOCHS")
                .takes_value(true)
                .global(true)
                .validator(is_parsable::<u8>)
                .help("Override the snapshot's unlocking duration"),
        )
        .arg(
            Arg::with_name("output_format")
                .long("output")
                .value_name("FORMAT")
                .takes_value(true)
                .global(true)
                .possible_values(&["display", "json"])
                .help("Output format"),
        )
        .subcommand(
            SubCommand::with_name("summary").about("Show the reconciled balance summary"),
        )
        .subcommand(
            SubCommand::with_name("vesting-state")
                .about("Show the vesting account state and the next vesting event"),
        )
        .subcommand(
            SubCommand::with_name("unlock-plan")
                .about("Show which positions an unlock would close")
                .arg(
                    Arg::with_name("amount")
                        .long("amount")
                        .value_name("AMOUNT")
                        .takes_value(true)
                        .required(true)
                        .validator(is_amount)
                        .help("Tokens to unlock, e.g. 1,250.5"),
                ),
        )
        .subcommand(
            SubCommand::with_name("voter-weight")
                .about("Show the governance voter weight")
                .arg(
                    Arg::with_name("epoch")
                        .long("epoch")
                        .value_name("EPOCH")
                        .takes_value(true)
                        .validator(is_parsable::<Epoch>)
                        .help("Epoch to evaluate [default: the epoch of --time]"),
                ),
        )
        .subcommand(
            SubCommand::with_name("next-vesting").about("Show the next vesting event"),
        )
}

fn process(matches: &ArgMatches<'_>) -> Result<String, Box<dyn error::Error>> {
    let (subcommand, sub_matches) = matches.subcommand();
    let sub_matches = sub_matches.unwrap_or(matches);
    let output_format = OutputFormat::from_matches_value(sub_matches.value_of("output_format"));

    let path = sub_matches
        .value_of("snapshot")
        .ok_or("--snapshot is required")?;
    let snapshot = Snapshot::load(Path::new(path))?;
    let config = snapshot.effective_config(ConfigOverrides {
        epoch_duration_seconds: value_t!(sub_matches, "epoch_duration", u64).ok(),
        unlocking_duration_epochs: value_t!(sub_matches, "unlocking_duration", u8).ok(),
    })?;
    let time = value_t!(sub_matches, "time", UnixTimestamp)
        .unwrap_or_else(|_| snapshot.ledger.unix_timestamp());
    let engine = StakeAccountingEngine::new(config)?;
    let account = &snapshot.account;
    debug!("evaluating {subcommand} at unix time {time} with {:?}", engine.config());

    let rendered = match subcommand {
        "summary" => output_format.formatted_string(&CliBalanceSummary {
            unix_timestamp: time,
            epoch: engine.config().epoch_at(time)?,
            custody_balance: account.custody_balance,
            summary: engine.get_balance_summary(account, time)?,
        }),
        "vesting-state" => output_format.formatted_string(&CliVestingState {
            state: engine.get_vesting_account_state(account, time)?,
            next_vesting_event: engine.get_next_vesting_event(&account.vesting_schedule, time)?,
        }),
        "unlock-plan" => {
            let amount = sub_matches
                .value_of("amount")
                .ok_or("--amount is required")?
                .parse::<Amount>()?;
            output_format.formatted_string(&CliUnlockPlan {
                plan: engine.select_unlock_plan(account, amount, time)?,
            })
        }
        "voter-weight" => {
            let epoch = match value_t!(sub_matches, "epoch", Epoch) {
                Ok(epoch) => epoch,
                Err(_) => engine.config().epoch_at(time)?,
            };
            output_format.formatted_string(&CliVoterWeight {
                epoch,
                voter_weight: engine.get_voter_weight(account, &snapshot.ledger, epoch)?,
            })
        }
        "next-vesting" => output_format.formatted_string(&CliNextVestingEvent {
            next_vesting_event: engine.get_next_vesting_event(&account.vesting_schedule, time)?,
        }),
        other => return Err(format!("Unknown subcommand '{other}'").into()),
    };
    Ok(rendered)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let matches = app(env!("CARGO_PKG_VERSION")).get_matches();

    match process(&matches) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => {
            eprintln!("Error: {err}");
            exit(1);
        }
    }
}
