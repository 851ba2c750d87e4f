use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

use crate::core::eligibility::{
    DEFAULT_MAX_APPROVED_APPLICATIONS, DEFAULT_MIN_REPAID_LOANS, EligibilityPolicy,
};

/// Flat rate applied when staff approve without naming one.
pub const DEFAULT_INTEREST_RATE: f64 = 5.0;

pub struct Config {
    pub log_level: String,
    pub jwt_secret: String,
    pub policy: EligibilityPolicy,
    pub default_interest_rate: f64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("policy", &self.policy)
            .field("default_interest_rate", &self.default_interest_rate)
            .finish()
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()), // Use a secure secret in production
            policy: EligibilityPolicy {
                max_approved_applications: parse_or(
                    "MAX_APPROVED_APPLICATIONS",
                    DEFAULT_MAX_APPROVED_APPLICATIONS,
                ),
                min_repaid_loans: parse_or("MIN_REPAID_LOANS", DEFAULT_MIN_REPAID_LOANS),
            },
            default_interest_rate: parse_or("DEFAULT_INTEREST_RATE", DEFAULT_INTEREST_RATE),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
