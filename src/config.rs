//! Application-level configuration loading: secrets, polling cadence and seed questions.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_CONFIG_PATH";
/// Environment variable holding the master secret; wins over the config file.
const MASTER_PIN_ENV: &str = "TRIVIA_MASTER_PIN";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_JOIN_CODE_ATTEMPTS: u32 = 8;

/// A question template copied into a game when seeding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedQuestion {
    pub text: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl SeedQuestion {
    fn new(text: &str, correct_answer: &str) -> Self {
        Self {
            text: text.into(),
            correct_answer: Some(correct_answer.into()),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    master_pin: Option<String>,
    poll_interval: Duration,
    join_code_attempts: u32,
    seed_questions: Vec<SeedQuestion>,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        seed_questions = app_config.seed_questions.len(),
                        "loaded configuration file"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(pin) = env::var(MASTER_PIN_ENV).ok().filter(|pin| !pin.is_empty()) {
            config.master_pin = Some(pin);
        }
        if config.master_pin.is_none() {
            warn!("no master PIN configured; game creation is disabled");
        }

        config
    }

    /// Configuration with the given master secret and every other value defaulted.
    pub fn new(master_pin: impl Into<String>) -> Self {
        Self {
            master_pin: Some(master_pin.into()),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_seed_questions(mut self, seed_questions: Vec<SeedQuestion>) -> Self {
        self.seed_questions = seed_questions;
        self
    }

    pub fn with_join_code_attempts(mut self, attempts: u32) -> Self {
        self.join_code_attempts = attempts.max(1);
        self
    }

    /// Process-wide secret gating game creation, if configured.
    pub fn master_pin(&self) -> Option<&str> {
        self.master_pin.as_deref()
    }

    /// Interval of the polling fallback used by game watchers.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Number of join codes tried before giving up on a collision streak.
    pub fn join_code_attempts(&self) -> u32 {
        self.join_code_attempts
    }

    pub fn seed_questions(&self) -> &[SeedQuestion] {
        &self.seed_questions
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            master_pin: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            join_code_attempts: DEFAULT_JOIN_CODE_ATTEMPTS,
            seed_questions: default_seed_questions(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    master_pin: Option<String>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    join_code_attempts: Option<u32>,
    #[serde(default)]
    seed_questions: Option<Vec<SeedQuestion>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            master_pin: value.master_pin.filter(|pin| !pin.is_empty()),
            poll_interval: value
                .poll_interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            join_code_attempts: value
                .join_code_attempts
                .map(|attempts| attempts.max(1))
                .unwrap_or(defaults.join_code_attempts),
            seed_questions: value.seed_questions.unwrap_or(defaults.seed_questions),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in question set shipped with the binary.
fn default_seed_questions() -> Vec<SeedQuestion> {
    vec![
        SeedQuestion::new("What is the capital of Australia?", "Canberra"),
        SeedQuestion::new("How many bones are in the adult human body?", "206"),
        SeedQuestion::new("Which planet has the most moons?", "Saturn"),
        SeedQuestion::new("In what year did the Berlin Wall fall?", "1989"),
        SeedQuestion::new("What is the chemical symbol for gold?", "Au"),
        SeedQuestion::new("Who painted the ceiling of the Sistine Chapel?", "Michelangelo"),
        SeedQuestion::new("What is the largest ocean on Earth?", "Pacific"),
        SeedQuestion::new("How many players are on a soccer team on the field?", "11"),
        SeedQuestion::new("What language has the most native speakers?", "Mandarin Chinese"),
        SeedQuestion::new("What is the smallest prime number?", "2"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_fills_missing_values_with_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{ "master_pin": "1234" }"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.master_pin(), Some("1234"));
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.join_code_attempts(), DEFAULT_JOIN_CODE_ATTEMPTS);
        assert_eq!(config.seed_questions().len(), 10);
    }

    #[test]
    fn raw_config_ignores_zero_and_empty_values() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "master_pin": "", "poll_interval_ms": 0, "join_code_attempts": 0, "seed_questions": [] }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.master_pin(), None);
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.join_code_attempts(), 1);
        assert!(config.seed_questions().is_empty());
    }
}
