mod config;
mod console;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use services::{AppServices, Clock, Notifier};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_SECRETS_FILE, load_github_config};
use crate::console::{Console, ConsoleNotifier};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    secrets: PathBuf,
    offline: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut secrets = std::env::var("STUDY_SECRETS_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE), PathBuf::from);
        let mut offline = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--secrets" => secrets = PathBuf::from(require_value(args, "--secrets")?),
                "--offline" => offline = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { secrets, offline })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  studyos [--secrets <path>] [--offline]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --secrets {DEFAULT_SECRETS_FILE}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_SECRETS_FILE, STUDY_GITHUB_TOKEN, STUDY_REPO_NAME,");
    eprintln!("  STUDY_GITHUB_API, STUDY_GITHUB_BRANCH, STUDY_COMMIT_MESSAGE, RUST_LOG");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    let clock = Clock::default_clock();
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);

    let services = if args.offline {
        tracing::info!("starting offline");
        AppServices::offline(clock, notifier)
    } else {
        match load_github_config(&args.secrets) {
            Ok(config) => AppServices::connect_github(config, clock, notifier).await,
            Err(err) => {
                tracing::warn!(error = %err, "no usable GitHub configuration");
                eprintln!("Remote storage is not configured: {err}");
                AppServices::offline(clock, notifier)
            }
        }
    };

    Console::open(services).await.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}
