//! Environment surface: `DB_*`, `CACHE_*`, `WEATHER_API_*`,
//! `FEATURE_*`, `LOG_LEVEL`, `TZ_DEFAULT`. Read once at startup with
//! plain `env::var` and a default, not a config-file layer, since the
//! whole surface here is a flat list of env vars.

use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_url: String,
    pub cache_default_ttl_seconds: u64,
    pub weather_api_url: Option<String>,
    pub weather_api_key: Option<String>,
    pub feature_scheduling_v1: bool,
    pub feature_conflict_detection: bool,
    pub feature_heat_policy: bool,
    pub log_level: String,
    pub tz_default: String,
    pub host: String,
    pub port: u16,
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Settings {
            db_url: env_or("DB_URL", "sqlite::memory:"),
            cache_default_ttl_seconds: env::var("CACHE_DEFAULT_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            weather_api_url: env::var("WEATHER_API_URL").ok(),
            weather_api_key: env::var("WEATHER_API_KEY").ok(),
            feature_scheduling_v1: env_bool("FEATURE_SCHEDULING_V1", true),
            feature_conflict_detection: env_bool("FEATURE_CONFLICT_DETECTION", true),
            feature_heat_policy: env_bool("FEATURE_HEAT_POLICY", true),
            log_level: env_or("LOG_LEVEL", "info"),
            tz_default: env_or("TZ_DEFAULT", "America/Phoenix"),
            host: env_or("HOST", "127.0.0.1"),
            port: env_or("PORT", "8080").parse().unwrap_or(8080),
        }
    }
}
