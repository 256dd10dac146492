//! Survey Server CLI - run the survey backend and inspect collected responses

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use survey_server::config::{self, ServeOverrides, ServeSettings, SurveyConfig};
use survey_server::storage::SqliteStore;
use survey_server::ui::{self, Icons};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "survey-server")]
#[command(version)]
#[command(about = "Survey backend - collect survey responses into SQLite and serve them as JSON")]
#[command(long_about = r#"
Survey Server stores survey submissions in a local SQLite database and exposes:
  • POST /api/submit        save one response
  • GET  /api/responses     list all responses, newest first
  • GET  /api/stats         aggregate statistics
  • GET  /api/export/csv    download every response as CSV
  • GET  /admin             read-only dashboard over the endpoints above

Example usage:
  survey-server init
  PORT=3000 survey-server serve --static-dir ./frontend
  survey-server stats --database survey.db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to survey.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory served for non-API paths
        #[arg(short, long)]
        static_dir: Option<PathBuf>,
    },

    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show statistics about collected responses
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Export all responses as CSV
    Export {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Database path for the offline commands: flag, then config file, then default
fn database_path(flag: Option<PathBuf>, config: Option<&SurveyConfig>) -> PathBuf {
    flag.or_else(|| config.and_then(|c| c.database.as_ref()).map(PathBuf::from))
        .unwrap_or_else(config::default_database_path)
}

fn open_existing(database: &Path) -> anyhow::Result<SqliteStore> {
    if !database.exists() {
        anyhow::bail!("database not found at {} (run `survey-server serve` first)", database.display());
    }
    Ok(SqliteStore::open(database)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, database, static_dir } => {
            let env_port = config::port_from_env();
            let settings = ServeSettings::resolve(
                ServeOverrides { port, database, static_dir },
                file_config.as_ref(),
                env_port.as_deref(),
            )?;

            config::ensure_db_dir(&settings.database)?;
            let store = match SqliteStore::open(&settings.database) {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!("Failed to initialize database {}: {}", settings.database.display(), e);
                    ui::error("Database initialization failed; not starting server");
                    return Err(e.into());
                }
            };

            ui::header("Survey Server");
            ui::info("Database", &format!("{} {}", Icons::DATABASE, settings.database.display()));
            ui::summary_row("Responses stored:", &store.count()?.to_string());
            ui::summary_row("API endpoint:", &format!("http://localhost:{}/api/submit", settings.port));
            ui::summary_row("Statistics:", &format!("http://localhost:{}/api/stats", settings.port));
            ui::summary_row("CSV export:", &format!("http://localhost:{}/api/export/csv", settings.port));
            ui::summary_row("Dashboard:", &format!("http://localhost:{}/admin", settings.port));

            survey_server::server::start_server(settings.port, store, &settings.static_dir).await?;
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &SurveyConfig::starter(), force)?;
            ui::success(&format!("Wrote config to {}", path.display()));
        }

        Commands::Stats { database, format } => {
            let database = database_path(database, file_config.as_ref());
            let store = open_existing(&database)?;
            let stats = store.stats()?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{} Survey Statistics ({:?})", Icons::STATS, database);
                println!("{}", ui::stats_table(&stats));

                for (title, counts) in [
                    ("Q1", &stats.q1_distribution),
                    ("Q4", &stats.q4_distribution),
                    ("Q5", &stats.q5_distribution),
                ] {
                    if counts.is_empty() {
                        continue;
                    }
                    ui::section(title);
                    println!("{}", ui::distribution_table(counts));
                }
            }
        }

        Commands::Export { database, output } => {
            let database = database_path(database, file_config.as_ref());
            let store = open_existing(&database)?;

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)?;
                    let rows = store.export_csv(file)?;
                    ui::success(&format!("{} Exported {} responses to {}", Icons::EXPORT, rows, path.display()));
                }
                None => {
                    let stdout = std::io::stdout();
                    let rows = store.export_csv(stdout.lock())?;
                    tracing::debug!("Exported {} responses to stdout", rows);
                }
            }
        }
    }

    Ok(())
}
