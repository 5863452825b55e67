use clap::{Args, Parser, Subcommand, ValueEnum};
use ipnetwork::IpNetwork;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API and management listeners (default)
    Serve,

    /// Operate on the message store directly, without the HTTP API
    Admin(AdminArgs),
}

#[derive(Clone, Debug, Args)]
pub struct AdminArgs {
    /// Admin password for this session; prompted for on stdin when omitted
    #[arg(long)]
    pub password: Option<AdminSecret>,

    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Clone, Debug, Subcommand)]
pub enum AdminCommand {
    /// List messages, newest first
    List {
        /// Only public messages
        #[arg(long, conflicts_with = "private")]
        public: bool,

        /// Only private messages
        #[arg(long)]
        private: bool,

        /// Only messages that have a reply
        #[arg(long, conflicts_with = "pending")]
        replied: bool,

        /// Only messages still waiting for a reply
        #[arg(long)]
        pending: bool,
    },

    /// Show a single message and its reply
    View {
        key: String,
    },

    /// Write (or overwrite) the reply to a message
    Reply {
        key: String,

        /// Reply text
        text: String,
    },

    /// Show aggregate message counts
    Stats,
}

#[derive(Clone, Debug, Args)]
pub struct Config {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub admin: AdminConfig,

    #[command(flatten)]
    pub messaging: MessagingConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub cors: CorsConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,

    #[command(flatten)]
    pub health: HealthConfig,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "CONTACT_DATABASE_URL", default_value = "sqlite://contact_messages.db")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long = "db-max-connections", env = "CONTACT_DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[arg(long = "db-acquire-timeout-secs", env = "CONTACT_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Milliseconds SQLite waits on a locked database before failing
    #[arg(long = "db-busy-timeout-ms", env = "CONTACT_DB_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "CONTACT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CONTACT_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Port for the management (health) listener
    #[arg(long, env = "CONTACT_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long, env = "CONTACT_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "CONTACT_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct AdminConfig {
    /// Shared secret for admin endpoints; admin access is disabled when unset
    #[arg(long = "admin-password", env = "CONTACT_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<AdminSecret>,
}

/// Admin shared secret. Never printed, not even through `Debug`.
#[derive(Clone)]
pub struct AdminSecret(String);

impl AdminSecret {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminSecret([REDACTED])")
    }
}

impl FromStr for AdminSecret {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

#[derive(Clone, Debug, Args)]
pub struct MessagingConfig {
    /// Minimum message length in characters, after trimming
    #[arg(long, env = "CONTACT_MESSAGE_MIN_LENGTH", default_value_t = 10)]
    pub message_min_length: usize,

    /// Maximum message length in characters, after trimming
    #[arg(long, env = "CONTACT_MESSAGE_MAX_LENGTH", default_value_t = 500)]
    pub message_max_length: usize,

    /// Maximum reply length in characters, after trimming
    #[arg(long, env = "CONTACT_REPLY_MAX_LENGTH", default_value_t = 5000)]
    pub reply_max_length: usize,

    /// Upper bound for the `limit` query parameter on listings
    #[arg(long, env = "CONTACT_MAX_PAGE_SIZE", default_value_t = 100)]
    pub max_page_size: i64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long = "rate-limit-per-second", env = "CONTACT_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long = "rate-limit-burst", env = "CONTACT_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter rate limit for message submission and reply checks
    #[arg(long = "submit-rate-limit-per-second", env = "CONTACT_SUBMIT_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub submit_per_second: u32,

    /// Burst allowance for message submission and reply checks
    #[arg(long = "submit-rate-limit-burst", env = "CONTACT_SUBMIT_RATE_LIMIT_BURST", default_value_t = 5)]
    pub submit_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*` for any
    #[arg(
        long = "cors-allowed-origins",
        env = "CONTACT_CORS_ALLOWED_ORIGINS",
        default_value = "*",
        value_delimiter = ','
    )]
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; OpenTelemetry export is disabled when unset
    #[arg(long, env = "CONTACT_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "CONTACT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the readiness database probe
    #[arg(long, env = "CONTACT_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

impl Cli {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
