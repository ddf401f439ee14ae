// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Roster CLI
//!
//! Command-line interface for Roster - participant records with duplicate
//! detection and merge.

mod commands;
mod config;
mod display;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use roster_core::{Influx, ParticipantRole, RosterError, StoreBackend};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::duplicates::Matching;
use commands::participants::ParticipantArgs;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "roster")]
#[command(version, about = "Participant records with duplicate detection and merge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: platform data directory/roster)
    #[arg(long, global = true, env = "ROSTER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(
        long,
        global = true,
        value_enum,
        env = "ROSTER_BACKEND",
        default_value_t = Backend::Sqlite
    )]
    backend: Backend,

    /// Name similarity ratio that must be exceeded for fuzzy matches
    #[arg(long, global = true, env = "ROSTER_MIN_RATIO", default_value_t = 0.7)]
    min_ratio: f64,

    /// Edit distance accepted as a fuzzy match regardless of ratio
    #[arg(long, global = true, env = "ROSTER_MAX_DISTANCE", default_value_t = 2)]
    max_distance: usize,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// SQLite database in the data directory
    Sqlite,
    /// Throwaway in-memory store
    Memory,
}

impl From<Backend> for StoreBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Sqlite => StoreBackend::Sqlite,
            Backend::Memory => StoreBackend::Memory,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Manage participants
    #[command(subcommand)]
    Participants(ParticipantCommands),

    /// List likely duplicate participants
    Duplicates {
        /// Group similar names instead of exact matches
        #[arg(long)]
        fuzzy: bool,

        /// With --fuzzy, follow chains of similar names
        #[arg(long, requires = "fuzzy")]
        transitive: bool,

        /// Print groups as JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge duplicate participants into one record
    Merge {
        /// Participant to keep (ID or ID prefix)
        primary: String,

        /// Participants to merge into it and delete
        #[arg(required = true)]
        secondaries: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage activity types
    #[command(subcommand)]
    ActivityTypes(ActivityTypeCommands),

    /// Manage scheduled activities
    #[command(subcommand)]
    Activities(ActivityCommands),

    /// Register a participant for an activity
    Register {
        /// Participant ID or ID prefix
        participant: String,
        /// Activity ID
        activity: String,
    },

    /// Remove a registration
    Unregister {
        /// Registration ID
        registration: String,
    },

    /// Record attendance for a registration
    Attend {
        /// Registration ID
        registration: String,

        /// Mark as absent instead
        #[arg(long)]
        absent: bool,
    },

    /// Assign a staff member to an activity
    Assign {
        /// Participant ID or ID prefix
        participant: String,
        /// Activity ID
        activity: String,
    },

    /// Remove a staff assignment
    Unassign {
        /// Participant ID or ID prefix
        participant: String,
        /// Activity ID
        activity: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ParticipantCommands {
    /// List participants
    List {
        /// Only participants linked to this activity type (ID or name)
        #[arg(long)]
        activity_type: Option<String>,

        /// Only physiotherapists and volunteers
        #[arg(long, conflicts_with = "activity_type")]
        staff: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show participant details
    Show {
        /// Participant ID or ID prefix
        id: String,
    },

    /// Add a participant
    Add {
        first_name: String,
        last_name: String,

        /// Staff role (physiotherapist, volunteer)
        #[arg(long)]
        role: Option<ParticipantRole>,

        /// Referral source (wgc, bov, physio, other, unknown)
        #[arg(long)]
        influx: Option<Influx>,

        /// Activity type ID or name (repeatable)
        #[arg(long = "activity-type", value_name = "TYPE")]
        activity_types: Vec<String>,

        /// Refuse to add when a similar name already exists
        #[arg(long)]
        strict: bool,
    },

    /// Edit a participant
    Update {
        /// Participant ID or ID prefix
        id: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Staff role (physiotherapist, volunteer)
        #[arg(long)]
        role: Option<ParticipantRole>,

        /// Referral source (wgc, bov, physio, other, unknown)
        #[arg(long)]
        influx: Option<Influx>,

        /// Replace activity types (repeatable)
        #[arg(long = "activity-type", value_name = "TYPE")]
        activity_types: Vec<String>,

        /// Remove the staff role
        #[arg(long, conflicts_with = "role")]
        clear_role: bool,

        /// Remove the referral source
        #[arg(long, conflicts_with = "influx")]
        clear_influx: bool,

        /// Unlink all activity types
        #[arg(long, conflicts_with = "activity_types")]
        clear_activity_types: bool,
    },

    /// Remove a participant and their registrations
    Remove {
        /// Participant ID or ID prefix
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Find participants with a similar name
    Similar { first_name: String, last_name: String },
}

#[derive(Subcommand)]
enum ActivityTypeCommands {
    /// List activity types
    List,

    /// Add an activity type
    Add {
        name: String,

        /// Description (10 to 255 characters)
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum ActivityCommands {
    /// List activities, most recent first
    List {
        /// Only activities of this type (ID or name)
        #[arg(long)]
        activity_type: Option<String>,
    },

    /// Schedule an activity
    Add {
        /// Activity type ID or name
        activity_type: String,

        /// Date, e.g. 2026-03-01
        date: String,

        #[arg(long)]
        comment: Option<String>,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let directive = if verbose { "roster=debug" } else { "roster=warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    // Resolve data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roster")
    });
    let config = CliConfig::new(
        data_dir,
        cli.backend.into(),
        cli.min_ratio,
        cli.max_distance,
    )?;

    match cli.command {
        Commands::Participants(cmd) => match cmd {
            ParticipantCommands::List {
                activity_type,
                staff,
                json,
            } => commands::participants::list(&config, activity_type.as_deref(), staff, json)?,
            ParticipantCommands::Show { id } => commands::participants::show(&config, &id)?,
            ParticipantCommands::Add {
                first_name,
                last_name,
                role,
                influx,
                activity_types,
                strict,
            } => {
                let args = ParticipantArgs {
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                    role,
                    influx,
                    activity_types,
                    ..ParticipantArgs::default()
                };
                commands::participants::add(&config, args, strict)?;
            }
            ParticipantCommands::Update {
                id,
                first_name,
                last_name,
                role,
                influx,
                activity_types,
                clear_role,
                clear_influx,
                clear_activity_types,
            } => {
                let args = ParticipantArgs {
                    first_name,
                    last_name,
                    role,
                    influx,
                    activity_types,
                    clear_role,
                    clear_influx,
                    clear_activity_types,
                };
                commands::participants::update(&config, &id, args)?;
            }
            ParticipantCommands::Remove { id, yes } => {
                commands::participants::remove(&config, &id, yes)?
            }
            ParticipantCommands::Similar {
                first_name,
                last_name,
            } => commands::participants::similar(&config, &first_name, &last_name)?,
        },
        Commands::Duplicates {
            fuzzy,
            transitive,
            json,
        } => {
            let matching = match (fuzzy, transitive) {
                (false, _) => Matching::Exact,
                (true, false) => Matching::Fuzzy,
                (true, true) => Matching::Transitive,
            };
            commands::duplicates::run(&config, matching, json)?;
        }
        Commands::Merge {
            primary,
            secondaries,
            yes,
        } => commands::merge::run(&config, &primary, &secondaries, yes)?,
        Commands::ActivityTypes(cmd) => match cmd {
            ActivityTypeCommands::List => commands::activities::list_types(&config)?,
            ActivityTypeCommands::Add { name, description } => {
                commands::activities::add_type(&config, &name, description.as_deref())?
            }
        },
        Commands::Activities(cmd) => match cmd {
            ActivityCommands::List { activity_type } => {
                commands::activities::list(&config, activity_type.as_deref())?
            }
            ActivityCommands::Add {
                activity_type,
                date,
                comment,
            } => commands::activities::add(&config, &activity_type, &date, comment.as_deref())?,
        },
        Commands::Register {
            participant,
            activity,
        } => commands::activities::register(&config, &participant, &activity)?,
        Commands::Unregister { registration } => {
            commands::activities::unregister(&config, &registration)?
        }
        Commands::Attend {
            registration,
            absent,
        } => commands::activities::attend(&config, &registration, absent)?,
        Commands::Assign {
            participant,
            activity,
        } => commands::activities::assign(&config, &participant, &activity)?,
        Commands::Unassign {
            participant,
            activity,
        } => commands::activities::unassign(&config, &participant, &activity)?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "roster", &mut io::stdout());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        display::error(&format!("Failed to set up logging: {}", e));
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Store details stay in the debug log; staff see the sanitized message.
            match e.downcast_ref::<RosterError>() {
                Some(roster_error) => {
                    debug!("{:#}", e);
                    display::error(&roster_error.user_message());
                }
                None => display::error(&format!("{:#}", e)),
            }
            ExitCode::FAILURE
        }
    }
}
