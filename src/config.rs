use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, ValueEnum};
use std::convert::Infallible;
use std::ffi::OsString;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "HOST", default_value = "localhost")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Environment mode (development, staging, production, ...)
    #[arg(long = "env", env = "ENV", default_value = "development")]
    pub env_mode: String,

    /// How long to wait for telemetry to flush on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Contact point host of the Cassandra/Scylla cluster
    #[arg(id = "db_host", long = "db-host", env = "DB_HOST", default_value = "localhost")]
    pub host: String,

    /// Contact point port of the Cassandra/Scylla cluster
    #[arg(id = "db_port", long = "db-port", env = "DB_PORT", default_value_t = 5432)]
    pub port: u16,

    #[arg(long = "db-user", env = "DB_USER", default_value = "admin")]
    pub user: String,

    #[arg(long = "db-password", env = "DB_PASSWORD", default_value = "admin", hide_env_values = true)]
    pub password: String,

    /// Keyspace holding the messages table
    #[arg(long = "db-keyspace", env = "DB_KEYSPACE", default_value = "messaging", value_parser = parse_keyspace)]
    pub keyspace: String,

    /// Create the keyspace and table on startup if they do not exist
    #[arg(
        long = "db-init",
        env = "DB_INIT",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = parse_flag
    )]
    pub init: bool,
}

impl DatabaseConfig {
    #[must_use]
    pub fn contact_point(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint for traces and metrics. Export is disabled when unset.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Parses the process arguments and environment. Exits with a usage error on invalid input.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(std::env::args_os(), |name| std::env::var(name).ok()).unwrap_or_else(|e| e.exit())
    }

    /// Parses `args`, reading environment variables through `lookup` instead of the process environment.
    ///
    /// A variable that is set but empty counts as unset, so the argument keeps its default.
    /// Command-line flags still take precedence over the environment.
    ///
    /// # Errors
    /// Returns `clap::Error` if an argument or environment value is invalid.
    pub fn load_from<I, T, F>(args: I, lookup: F) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        F: Fn(&str) -> Option<String>,
    {
        let mut command = Self::command();

        let env_values: Vec<(String, Option<String>)> = command
            .get_arguments()
            .filter_map(|arg| {
                let name = arg.get_env()?.to_str()?;
                Some((arg.get_id().as_str().to_owned(), lookup(name).filter(|value| !value.is_empty())))
            })
            .collect();

        for (id, value) in env_values {
            command = command.mut_arg(id, |arg| {
                let arg = arg.env(Option::<&'static str>::None);
                match value {
                    Some(value) => arg.default_value(value),
                    None => arg,
                }
            });
        }

        let matches = command.try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }
}

/// Case-insensitive match against `true`, `1`, `yes` and `on`. Anything else is false.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[allow(clippy::unnecessary_wraps)]
fn parse_flag(value: &str) -> Result<bool, Infallible> {
    Ok(is_truthy(value))
}

/// The keyspace name ends up unquoted inside DDL, so it has to be a plain CQL identifier.
/// Unquoted identifiers are case-insensitive in CQL, so the name is normalised to lowercase.
fn parse_keyspace(value: &str) -> Result<String, String> {
    let valid = !value.is_empty()
        && value.len() <= 48
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && value.chars().next().is_some_and(|c| c.is_ascii_alphabetic());

    if valid {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(format!("'{value}' is not a valid keyspace name (letters, digits and '_', starting with a letter, max 48)"))
    }
}
