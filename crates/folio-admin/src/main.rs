//! Folio Admin - command-line console for the portfolio admin account

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_admin::{config::AdminConfig, report, Shell};
use folio_core::{
    policy, upload, AuthService, FileStore, MemoryNotifier, SystemClock, TracingNotifier,
    UploadKind,
};

/// Folio Admin - manage the portfolio admin account
#[derive(Parser)]
#[command(name = "folio-admin")]
#[command(about = "Admin console for the Folio portfolio site")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory holding the store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive admin session
    Shell,

    /// Show lockout state and password age
    Status,

    /// Check a password against the policy
    Validate {
        /// Candidate password
        password: String,
    },

    /// Print a masked hint for a password
    Hint {
        /// Password to mask
        password: String,
    },

    /// Print password management recommendations
    Recommendations,

    /// Check whether an upload would be accepted
    CheckUpload {
        /// What the file is for
        #[arg(long, value_enum)]
        kind: UploadKindArg,

        /// MIME type reported for the file
        #[arg(long)]
        mime: String,

        /// File size in bytes
        #[arg(long)]
        size: u64,

        /// Original file name (only used for reporting)
        #[arg(long)]
        name: Option<String>,
    },

    /// Print the effective configuration, optionally writing it to a file
    Config {
        /// Write the configuration here
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UploadKindArg {
    Image,
    Resume,
}

impl From<UploadKindArg> for UploadKind {
    fn from(arg: UploadKindArg) -> Self {
        match arg {
            UploadKindArg::Image => UploadKind::Image,
            UploadKindArg::Resume => UploadKind::Resume,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_admin=info,folio_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = AdminConfig::load_or_default(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command {
        Commands::Shell => {
            let store = Arc::new(FileStore::open(config.store_path())?);
            info!(store = %store.path().display(), "Starting admin shell");

            let notices = Arc::new(MemoryNotifier::new());
            let service = AuthService::new(store, SystemClock, &config.auth)?
                .with_notification(Arc::new(TracingNotifier))
                .with_notification(notices.clone());

            let mut shell = Shell::new(service, notices, config.login_delay());
            let stdin = BufReader::new(tokio::io::stdin());
            shell.run(stdin, tokio::io::stdout()).await?;
        }

        Commands::Status => {
            let store = Arc::new(FileStore::open(config.store_path())?);
            let service = AuthService::new(store, SystemClock, &config.auth)?;
            print!("{}", report::render_status(&service)?);
        }

        Commands::Validate { password } => {
            let result = policy::validate(&password);
            print!("{}", report::render_policy(&result));
            if !result.is_valid() {
                std::process::exit(1);
            }
        }

        Commands::Hint { password } => {
            println!("{}", policy::password_hint(&password));
        }

        Commands::Recommendations => {
            for recommendation in policy::recommendations() {
                println!("- {}", recommendation);
            }
        }

        Commands::CheckUpload {
            kind,
            mime,
            size,
            name,
        } => {
            let label = name.clone().unwrap_or_else(|| "file".to_string());
            let extension = name.as_deref().map(upload::file_extension).unwrap_or_default();

            match upload::check_upload(kind.into(), &mime, size) {
                Ok(()) => println!("{} accepted ({}, {} bytes)", label, mime, size),
                Err(rejection) => {
                    error!(file = %label, extension = %extension, "Upload rejected");
                    println!("{} rejected: {}", label, rejection);
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            print!("{}", config.to_toml()?);
            if let Some(path) = output {
                config.save(&path)?;
                info!("Configuration written to {:?}", path);
            }
        }
    }

    Ok(())
}
