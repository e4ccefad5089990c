use std::env;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "./.db/crm_webhooks.db";
pub const DEFAULT_WEBHOOK_LOG_CAPACITY: usize = 1000;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Number of payloads kept in the in-memory diagnostic log
    pub webhook_log_capacity: usize,
    pub max_payload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("PORT", defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            webhook_log_capacity: parse_var("WEBHOOK_LOG_CAPACITY", defaults.webhook_log_capacity),
            max_payload_bytes: parse_var("MAX_PAYLOAD_BYTES", defaults.max_payload_bytes),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            webhook_log_capacity: DEFAULT_WEBHOOK_LOG_CAPACITY,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when it is
/// missing or invalid.
fn parse_var<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => parse_or_default(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or_default<T: FromStr + std::fmt::Display>(name: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            log::warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }
    }
}
