//! SugarCheck command-line front-end.
//!
//! Drives the same command layer a mobile shell would and prints results
//! as JSON.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;

use sugarcheck_lib::{
    commands,
    profile::ProfileInput,
    settings::SourceKind,
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "sugarcheck")]
#[command(about = "Glucose tracking from the command line")]
#[command(version)]
struct Args {
    /// Directory holding the local store and settings
    #[arg(long, env = "SUGARCHECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a glucose value in mg/dL
    Classify {
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
    /// Classify a random placeholder value
    SpotCheck,
    /// Fetch readings from the configured source once
    Refresh,
    /// Latest reading, classification, trend and sensor status
    Dashboard {
        #[arg(long, default_value_t = 12)]
        limit: u64,
    },
    /// Stored readings, newest first
    History {
        #[arg(long, default_value_t = 50)]
        limit: u64,
        /// Only readings at or after this RFC3339 time
        #[arg(long, requires = "to")]
        from: Option<DateTime<Utc>>,
        /// Only readings at or before this RFC3339 time
        #[arg(long, requires = "from")]
        to: Option<DateTime<Utc>>,
    },
    /// Delete all stored readings
    Clear,
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Sensor(SensorCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Refresh periodically until interrupted
    Monitor,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Set {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        age: String,
        #[arg(long, default_value = "")]
        gender: String,
        #[arg(long, default_value = "")]
        medical_history: String,
    },
}

#[derive(Subcommand, Debug)]
enum SensorCommand {
    /// Record a new sensor insertion
    Start {
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        lifetime_days: Option<u32>,
    },
    Status,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Mock,
    File,
}

impl From<SourceArg> for SourceKind {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Mock => SourceKind::Mock,
            SourceArg::File => SourceKind::File,
        }
    }
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        refresh_interval_secs: Option<u64>,
        #[arg(long, value_enum)]
        source: Option<SourceArg>,
        #[arg(long)]
        feed_path: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Commands report errors as strings; lift them back into `anyhow`.
fn lift<T>(result: Result<T, String>) -> Result<T> {
    result.map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    sugarcheck_lib::init_logging();

    let Args { data_dir, command } = Args::parse();

    let data_dir = match data_dir {
        Some(dir) => dir,
        None => sugarcheck_lib::default_data_dir()?,
    };
    let state = AppState::open(data_dir)?;
    run(&state, command).await
}

async fn run(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Classify { value } => print_json(&lift(commands::classify_glucose(value))?),
        Command::SpotCheck => print_json(&lift(commands::spot_check(state))?),
        Command::Refresh => print_json(&lift(commands::refresh_readings(state).await)?),
        Command::Dashboard { limit } => {
            print_json(&lift(commands::get_dashboard(state, limit).await)?)
        }
        Command::History { limit, from, to } => {
            let readings = match (from, to) {
                (Some(from), Some(to)) => {
                    lift(commands::list_readings_between(state, from, to).await)?
                }
                _ => lift(commands::list_readings(state, limit).await)?,
            };
            print_json(&readings)
        }
        Command::Clear => {
            let removed = lift(commands::clear_readings(state).await)?;
            info!("Removed {removed} readings");
            print_json(&removed)
        }
        Command::Profile(ProfileCommand::Show) => {
            print_json(&lift(commands::get_profile(state).await)?)
        }
        Command::Profile(ProfileCommand::Set {
            name,
            age,
            gender,
            medical_history,
        }) => {
            let input = ProfileInput {
                name,
                age,
                gender,
                medical_history,
            };
            print_json(&lift(commands::save_profile(state, input).await)?)
        }
        Command::Sensor(SensorCommand::Start { at, lifetime_days }) => {
            print_json(&lift(commands::start_sensor(state, at, lifetime_days))?)
        }
        Command::Sensor(SensorCommand::Status) => {
            print_json(&lift(commands::get_sensor_status(state))?)
        }
        Command::Settings(SettingsCommand::Show) => {
            print_json(&lift(commands::get_settings(state))?)
        }
        Command::Settings(SettingsCommand::Set {
            refresh_interval_secs,
            source,
            feed_path,
        }) => print_json(&lift(commands::update_monitor_settings(
            state,
            refresh_interval_secs,
            source.map(SourceKind::from),
            feed_path,
        ))?),
        Command::Monitor => {
            lift(commands::start_monitor(state).await)?;
            info!("Monitoring; press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;
            lift(commands::stop_monitor(state).await)?;
            info!("Monitor stopped");
            Ok(())
        }
    }
}
