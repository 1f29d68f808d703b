//! Electsys CLI — entry point.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use electsys::Category;
use electsys_cli::config::{load_config, resolve_config_path, resolve_cookie};
use electsys_cli::runner::ElectionRunner;

#[derive(Parser)]
#[command(
    name = "electsys",
    about = "Electsys — course election against the SJTU academic portal",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Portal cookie header (e.g. "JSESSIONID=..."). Also reads ELECTSYS_COOKIE.
    #[arg(long, global = true)]
    cookie: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the student identity behind the session cookie.
    Whoami,

    /// Print the election parameters as JSON.
    Params {
        /// Keep going when a category tab is missing and print what was found.
        #[arg(long)]
        partial: bool,
    },

    /// Submit elections for one or more classes.
    Elect {
        /// Category: 0 major-required, 1 general-education-I, 2 general-education-II.
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=2))]
        category: i64,

        /// Class (teaching section) ids.
        #[arg(required = true)]
        classes: Vec<String>,

        /// Keep submitting until every class is elected or settled.
        #[arg(long)]
        until_success: bool,

        /// Run up to this many rounds; implies repeating rounds even
        /// without --until-success.
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Wait between rounds, overriding the config file.
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "electsys", &mut std::io::stdout());
            Ok(())
        }
        command => run_portal_command(command, cli.config.as_deref(), cli.cookie.as_deref()),
    }
}

/// Commands that talk to the portal.
fn run_portal_command(command: Commands, config: Option<&str>, cookie: Option<&str>) -> Result<()> {
    let config_path = resolve_config_path(config);
    let config = load_config(config_path.as_deref())?;
    let cookie = resolve_cookie(cookie)?;
    let session = config.session(&cookie)?;
    let portal = config.portal();

    match command {
        Commands::Whoami => {
            let identity = portal
                .fetch_identity(&session)
                .context("could not read student identity; is the cookie still logged in?")?;
            println!("{identity}");
        }

        Commands::Params { partial } => {
            let identity = portal.fetch_identity(&session)?;
            let value = if partial {
                let ctx = portal.fetch_partial_context(&session, &identity)?;
                let missing = ctx.missing_fields();
                serde_json::json!({
                    "student_id": identity,
                    "context": ctx,
                    "missing": missing,
                })
            } else {
                let ctx = portal
                    .fetch_context(&session, &identity)
                    .context("election page is missing parameters; try --partial")?;
                serde_json::json!({
                    "student_id": identity,
                    "context": ctx,
                })
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::Elect {
            category,
            classes,
            until_success,
            max_rounds,
            interval_ms,
        } => {
            let identity = portal.fetch_identity(&session)?;
            let context = portal.fetch_partial_context(&session, &identity)?;
            if let Some(selected) = Category::from_index(category) {
                context.window(selected).with_context(|| {
                    format!("election page has no usable window for category {selected}")
                })?;
            }
            tracing::info!(student = %identity, classes = classes.len(), "starting election");

            let runner = ElectionRunner {
                until_success,
                max_rounds,
                interval: Duration::from_millis(interval_ms.unwrap_or(config.round_interval_ms)),
            };
            let summary = runner.run(&classes, |class_id| {
                portal.elect_partial(&session, &identity, &context, category, class_id)
            })?;

            println!("{}", serde_json::to_string_pretty(&summary)?);
            if summary.elected().count() < classes.len() {
                std::process::exit(2);
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
