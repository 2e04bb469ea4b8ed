use helpdesk_core::types::UserId;

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Bot configuration loaded from environment variables.
#[derive(Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub database_url: String,
    /// Operators: may open the operator panel and resolve tickets.
    pub operator_ids: Vec<UserId>,
    pub telegram_api_url: String,
    /// Long-polling timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,
    pub db_max_connections: u32,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"<redacted>")
            .field("database_url", &"<redacted>")
            .field("operator_ids", &self.operator_ids)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var              | Default                    |
    /// |----------------------|----------------------------|
    /// | `TELEGRAM_BOT_TOKEN` | required                   |
    /// | `DATABASE_URL`       | required                   |
    /// | `ADMIN_USER_IDS`     | required, comma-separated  |
    /// | `TELEGRAM_API_URL`   | `https://api.telegram.org` |
    /// | `POLL_TIMEOUT_SECS`  | `30`                       |
    /// | `DB_MAX_CONNECTIONS` | `10`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let telegram_token = required("TELEGRAM_BOT_TOKEN")?;
        let database_url = required("DATABASE_URL")?;
        let operator_ids = parse_operator_ids(&required("ADMIN_USER_IDS")?)?;

        let telegram_api_url =
            lookup("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.into());

        let poll_timeout_secs = match lookup("POLL_TIMEOUT_SECS") {
            Some(v) => parse_number("POLL_TIMEOUT_SECS", &v)?,
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => parse_number("DB_MAX_CONNECTIONS", &v)?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        Ok(Self {
            telegram_token,
            database_url,
            operator_ids,
            telegram_api_url,
            poll_timeout_secs,
            db_max_connections,
        })
    }
}

/// Parse a comma-separated list of user ids, dropping blanks and duplicates.
pub fn parse_operator_ids(raw: &str) -> Result<Vec<UserId>, ConfigError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id: UserId = part.parse().map_err(|_| ConfigError::Invalid {
            name: "ADMIN_USER_IDS",
            expected: "a comma-separated list of integer user ids",
            value: part.to_string(),
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(ConfigError::Missing("ADMIN_USER_IDS"));
    }
    Ok(ids)
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected: "a non-negative integer",
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
