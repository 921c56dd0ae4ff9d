use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::assessment::classifier::Thresholds;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or scoring values are out of range.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub scoring: ScoringConfig,
}

/// Scoring policy for one synthesis run. Read once at startup and passed into
/// the controller explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// 0-100. Applied to every evaluation in a scenario that needed a follow-up.
    pub follow_up_penalty_percent: f64,
    pub thresholds: Thresholds,
    /// Upper bound on in-flight evaluator calls per run.
    pub evaluator_concurrency: usize,
    /// Budget for the whole evaluator fan-out of one run.
    pub evaluation_timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            follow_up_penalty_percent: 10.0,
            thresholds: Thresholds::default(),
            evaluator_concurrency: 4,
            evaluation_timeout: Duration::from_secs(180),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.follow_up_penalty_percent) {
            bail!(
                "FOLLOW_UP_PENALTY_PERCENT must be within 0-100, got {}",
                self.follow_up_penalty_percent
            );
        }
        if !(0.0..=10.0).contains(&self.thresholds.strength) {
            bail!(
                "STRENGTH_THRESHOLD must be within 0-10, got {}",
                self.thresholds.strength
            );
        }
        if self.evaluator_concurrency == 0 {
            bail!("EVALUATOR_CONCURRENCY must be at least 1");
        }
        if self.evaluation_timeout.is_zero() {
            bail!("EVALUATION_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }

    fn from_env() -> Result<Self> {
        let defaults = ScoringConfig::default();
        let config = ScoringConfig {
            follow_up_penalty_percent: optional_env(
                "FOLLOW_UP_PENALTY_PERCENT",
                defaults.follow_up_penalty_percent,
            )?,
            thresholds: Thresholds {
                strength: optional_env("STRENGTH_THRESHOLD", defaults.thresholds.strength)?,
            },
            evaluator_concurrency: optional_env(
                "EVALUATOR_CONCURRENCY",
                defaults.evaluator_concurrency,
            )?,
            evaluation_timeout: Duration::from_secs(optional_env(
                "EVALUATION_TIMEOUT_SECS",
                defaults.evaluation_timeout.as_secs(),
            )?),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            scoring: ScoringConfig::from_env()?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
