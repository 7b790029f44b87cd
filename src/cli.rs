//! Command-line interface.
//!
//! Flags keep the camel-case names operators already use (`--dbHost`,
//! `--initialCredits`). Each flag that is given overrides the matching
//! configuration key; flags left out fall back to file, environment, and
//! built-in defaults.

use clap::{Args, Parser, Subcommand};

/// Y Network news pipeline
#[derive(Debug, Parser)]
#[command(name = "ynews", version, about)]
pub struct Cli {
    /// Configuration file (TOML, optional)
    #[arg(long, global = true, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Which service to run.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream newly stored articles to subscribers
    Publisher(PublisherArgs),
    /// Accept articles from journalists and store them
    Aggregator(AggregatorArgs),
}

/// Database connection flags shared by both services.
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    /// Database host
    #[arg(long = "dbHost")]
    pub db_host: Option<String>,

    /// Database port
    #[arg(long = "dbPort")]
    pub db_port: Option<u16>,

    /// Database user
    #[arg(long = "dbUser")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long = "dbPassword")]
    pub db_password: Option<String>,

    /// Database name
    #[arg(long = "dbName")]
    pub db_name: Option<String>,

    /// SSL mode for the database connection
    #[arg(long = "dbSSLMode")]
    pub db_ssl_mode: Option<String>,
}

impl DatabaseArgs {
    fn push_overrides(&self, overrides: &mut Vec<(&'static str, String)>) {
        let pairs = [
            ("database.host", self.db_host.clone()),
            ("database.port", self.db_port.map(|p| p.to_string())),
            ("database.user", self.db_user.clone()),
            ("database.password", self.db_password.clone()),
            ("database.name", self.db_name.clone()),
            ("database.ssl_mode", self.db_ssl_mode.clone()),
        ];
        overrides.extend(pairs.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
    }
}

/// Publisher flags.
#[derive(Debug, Clone, Default, Args)]
pub struct PublisherArgs {
    /// Websocket service address
    #[arg(long)]
    pub addr: Option<String>,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Full-content articles granted to each new subscriber session
    #[arg(long = "initialCredits")]
    pub initial_credits: Option<u32>,
}

/// Aggregator flags.
#[derive(Debug, Clone, Default, Args)]
pub struct AggregatorArgs {
    /// Websocket service address
    #[arg(long)]
    pub addr: Option<String>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

impl Command {
    /// Configuration overrides implied by the given flags.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();

        match self {
            Self::Publisher(args) => {
                if let Some(addr) = &args.addr {
                    overrides.push(("server.publisher_addr", addr.clone()));
                }
                args.database.push_overrides(&mut overrides);
                if let Some(credits) = args.initial_credits {
                    overrides.push(("broker.initial_credits", credits.to_string()));
                }
            }
            Self::Aggregator(args) => {
                if let Some(addr) = &args.addr {
                    overrides.push(("server.aggregator_addr", addr.clone()));
                }
                args.database.push_overrides(&mut overrides);
            }
        }

        overrides
    }
}
