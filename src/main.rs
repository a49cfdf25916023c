use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use control_score::scoring::{AssessmentInput, FamilyCode, ImplementationStatus};
use control_score::session::{SessionError, SessionState};
use control_score::{config, output, scoring, session};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_STORAGE: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(clap::Args, Debug)]
struct Ratings {
    /// Protect rating (0-3)
    #[arg(short, long)]
    protect: u8,

    /// Detect rating (0-3)
    #[arg(short, long)]
    detect: u8,

    /// Respond rating (0-3)
    #[arg(short, long)]
    respond: u8,

    /// Implementation status: 0-3 or not-implemented, partial, largely, full
    #[arg(long)]
    status: ImplementationStatus,

    /// Self-reported implementation percentage (0-100)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    percentage: Decimal,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the overall and per-family scores (default if no subcommand)
    Report {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Record a control assessment in the current session
    Add {
        /// Control family code (e.g. AC)
        family: FamilyCode,
        /// Control identifier (e.g. AC-2)
        control_id: String,
        #[command(flatten)]
        ratings: Ratings,
    },
    /// Score a control without recording it
    Score {
        #[command(flatten)]
        ratings: Ratings,
    },
    /// List recorded controls in the order they were added
    List {
        /// Only show controls from this family
        #[arg(short, long)]
        family: Option<FamilyCode>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show the family catalog and weights
    Families,
    /// Discard every recorded assessment
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Interactively create a config file
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "control-score")]
#[command(about = "Weighted compliance scoring for control self-assessments", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/control-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to session file (defaults to ~/.config/control-score/session.json)
    #[arg(short, long, global = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(EXIT_STORAGE);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let command = cli.command.unwrap_or(Commands::Report {
        format: OutputFormat::Table,
    });
    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init = command {
        if let Err(e) = config::init::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate catalog at startup
    let catalog = config.effective_catalog();
    if let Err(errors) = scoring::validate_catalog(&catalog) {
        eprintln!("Catalog config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
    if let Some(total) = config.unnormalized_weight() {
        tracing::warn!(%total, "catalog weights do not sum to 1.0; overall score is normalized by assessed weight");
    }

    let use_colors = output::should_use_colors();

    // Commands that never touch the session
    match &command {
        Commands::Families => {
            println!("{}", output::format_catalog(&catalog, use_colors));
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Score { ratings } => {
            match scoring::score_control(
                ratings.protect,
                ratings.detect,
                ratings.respond,
                ratings.status,
                ratings.percentage,
            ) {
                Ok(score) => println!("{}", output::format_control_score(&score, use_colors)),
                Err(e) => {
                    eprintln!("Invalid assessment: {}", e);
                    std::process::exit(EXIT_INPUT);
                }
            }
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    let session_path = cli
        .session
        .map(PathBuf::from)
        .unwrap_or_else(|| config.effective_session_path());

    if let Commands::Reset { yes } = command {
        if !yes {
            let confirmed = config::init::prompt_yes_no(
                &format!("Discard all assessments in {}?", session_path.display()),
                false,
            )
            .unwrap_or(false);
            if !confirmed {
                println!("Aborted.");
                std::process::exit(EXIT_SUCCESS);
            }
        }
        if let Err(e) = session::save_session_state(&session_path, &SessionState::new()) {
            eprintln!("Session error: {:#}", e);
            std::process::exit(EXIT_STORAGE);
        }
        println!("Session cleared.");
        std::process::exit(EXIT_SUCCESS);
    }

    // Load and replay session
    let mut active = match session::open_session(&session_path, catalog) {
        Ok(s) => s,
        Err(e @ SessionError::Storage(_)) => {
            eprintln!("Session error: {:#}", e);
            std::process::exit(EXIT_STORAGE);
        }
        Err(e @ SessionError::CatalogMismatch { .. }) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    tracing::debug!(
        assessments = active.engine().len(),
        session = %session_path.display(),
        "session ready"
    );

    // Route based on subcommand
    match command {
        Commands::Add {
            family,
            control_id,
            ratings,
        } => {
            let input = AssessmentInput {
                family,
                control_id,
                protect: ratings.protect,
                detect: ratings.detect,
                respond: ratings.respond,
                status: ratings.status,
                percentage: ratings.percentage,
            };
            let record = match active.record(input) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Invalid assessment: {}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };

            if let Err(e) = session::save_session_state(&session_path, active.state()) {
                eprintln!("Session error: {:#}", e);
                std::process::exit(EXIT_STORAGE);
            }

            println!("{}", output::format_record(&record, use_colors));
            println!("{}", output::format_overall(&active.engine().report(), use_colors));
        }
        Commands::List { family, format } => {
            if let Some(ref code) = family {
                if let Err(e) = active.engine().catalog().get(code) {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_INPUT);
                }
            }
            let rows = active.timeline(family.as_ref());
            match format {
                OutputFormat::Table => {
                    println!("{}", output::format_control_list(&rows, use_colors))
                }
                OutputFormat::Tsv => {
                    let records: Vec<_> = rows.iter().map(|(_, r)| *r).collect();
                    println!("{}", output::format_control_tsv(&records));
                }
                OutputFormat::Json => {
                    let records: Vec<_> = rows.iter().map(|(_, r)| *r).collect();
                    print_json(&records);
                }
            }
        }
        Commands::Report { format } => {
            let report = active.engine().report();
            match format {
                OutputFormat::Table => {
                    println!("{}", output::format_overall(&report, use_colors));
                    println!();
                    println!("{}", output::format_family_scores(&report.families, use_colors));
                }
                OutputFormat::Tsv => {
                    println!("{}", output::format_family_tsv(&report.families));
                }
                OutputFormat::Json => print_json(&report),
            }
        }
        Commands::Families | Commands::Score { .. } | Commands::Reset { .. } | Commands::Init => {}
    }

    std::process::exit(EXIT_SUCCESS);
}
