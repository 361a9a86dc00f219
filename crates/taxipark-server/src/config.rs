use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BIND: &str = "TAXIPARK_BIND";
pub const ENV_DB_PATH: &str = "TAXIPARK_DB_PATH";
pub const ENV_SESSION_SECRET: &str = "TAXIPARK_SESSION_SECRET";
pub const ENV_SESSION_TTL_SECS: &str = "TAXIPARK_SESSION_TTL_SECS";
pub const ENV_LOG_JSON: &str = "TAXIPARK_LOG_JSON";
pub const ENV_MAX_CONNECTIONS: &str = "TAXIPARK_MAX_CONNECTIONS";

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub db_path: PathBuf,
    pub session_secret: Vec<u8>,
    pub session_ttl: Duration,
    pub log_json: bool,
    pub max_connections: usize,
}

impl ServerConfig {
    /// Read configuration from the environment. A missing session secret
    /// gets a random one, which invalidates sessions across restarts.
    pub fn from_env() -> Self {
        let session_secret = match env::var(ENV_SESSION_SECRET) {
            Ok(v) if !v.trim().is_empty() => v.into_bytes(),
            _ => crate::auth::random_secret(),
        };
        Self {
            bind: env::var(ENV_BIND).unwrap_or_else(|_| "127.0.0.1:8000".to_string()),
            db_path: PathBuf::from(
                env::var(ENV_DB_PATH).unwrap_or_else(|_| "taxipark.sqlite".to_string()),
            ),
            session_secret,
            session_ttl: Duration::from_secs(env_u64(ENV_SESSION_TTL_SECS, 14 * 24 * 3600)),
            log_json: env_bool(ENV_LOG_JSON, false),
            max_connections: env_usize(ENV_MAX_CONNECTIONS, 8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_helpers_fall_back_to_defaults() {
        assert!(env_bool("TAXIPARK_TEST_UNSET_BOOL", true));
        assert_eq!(env_u64("TAXIPARK_TEST_UNSET_U64", 42), 42);
        assert_eq!(env_usize("TAXIPARK_TEST_UNSET_USIZE", 7), 7);
    }
}
