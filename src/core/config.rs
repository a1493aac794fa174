use chrono_tz::Tz;

/// Ticket time-to-live: 2 hours
pub const DEFAULT_TICKET_TTL_MS: i64 = 2 * 60 * 60 * 1000;

/// Sweep tick: 1 second
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1000;

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/kot-engine | Work directory (state database, logs) |
/// | CATALOG_URL | http://localhost:4000 | Remote catalog base URL |
/// | TIMEZONE | Asia/Kolkata | Business timezone (day keys, printed dates) |
/// | TICKET_TTL_MS | 7200000 | Ticket expiry in milliseconds |
/// | SWEEP_INTERVAL_MS | 1000 | Eviction sweep tick in milliseconds |
#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory holding the state database
    pub work_dir: String,
    /// Remote catalog base URL
    pub catalog_url: String,
    /// Business timezone
    pub timezone: Tz,
    /// Ticket expiry (milliseconds from creation)
    pub ticket_ttl_ms: i64,
    /// Sweep tick interval (milliseconds)
    pub sweep_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/kot-engine".into()),
            catalog_url: std::env::var("CATALOG_URL")
                .unwrap_or_else(|_| "http://localhost:4000".into()),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Asia::Kolkata),
            ticket_ttl_ms: std::env::var("TICKET_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TICKET_TTL_MS),
            sweep_interval_ms: std::env::var("SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }

    /// Override the work directory (test scenarios)
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
