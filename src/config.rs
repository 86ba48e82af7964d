use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_AGGRESSION_FACTOR, DEFAULT_BASE_DECAY_CONSTANT, DEFAULT_MAX_BOOST_EFFECT,
    DEFAULT_TIME_OF_DAY_FACTOR,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub trust_proxy: bool,
    pub rate_limit: RateLimitConfig,
    pub hermes: HermesEnvConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 900,
            max_requests: 500,
        }
    }
}

/// Startup seeds for the Hermes engine. Runtime changes go through the admin API.
#[derive(Debug, Clone)]
pub struct HermesEnvConfig {
    pub max_boost_effect: f64,
    pub base_decay_constant: f64,
    pub aggression_factor: f64,
    pub time_of_day_factor: f64,
    pub initial_system_load: f64,
}

impl Default for HermesEnvConfig {
    fn default() -> Self {
        Self {
            max_boost_effect: DEFAULT_MAX_BOOST_EFFECT,
            base_decay_constant: DEFAULT_BASE_DECAY_CONSTANT,
            aggression_factor: DEFAULT_AGGRESSION_FACTOR,
            time_of_day_factor: DEFAULT_TIME_OF_DAY_FACTOR,
            initial_system_load: 0.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let hermes_defaults = HermesEnvConfig::default();
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            trust_proxy: env_or_bool("TRUST_PROXY", false),
            rate_limit: RateLimitConfig {
                window_secs: env_or_parse("RATE_LIMIT_WINDOW_SECS", 900_u64),
                max_requests: env_or_parse("RATE_LIMIT_MAX", 500_u64),
            },
            hermes: HermesEnvConfig {
                max_boost_effect: env_or_parse(
                    "HERMES_MAX_BOOST_EFFECT",
                    hermes_defaults.max_boost_effect,
                ),
                base_decay_constant: env_or_parse(
                    "HERMES_BASE_DECAY_CONSTANT",
                    hermes_defaults.base_decay_constant,
                ),
                aggression_factor: env_or_parse(
                    "HERMES_AGGRESSION_FACTOR",
                    hermes_defaults.aggression_factor,
                ),
                time_of_day_factor: env_or_parse(
                    "HERMES_TIME_OF_DAY_FACTOR",
                    hermes_defaults.time_of_day_factor,
                ),
                initial_system_load: env_or_parse(
                    "HERMES_INITIAL_SYSTEM_LOAD",
                    hermes_defaults.initial_system_load,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
