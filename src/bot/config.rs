use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

/* Config gathers everything the bot needs at startup.
 * Values come from the environment (optionally via a .env file),
 * with the bot token falling back to a local token file.
 */

const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
const TOKEN_FILE_VAR: &str = "TELEGRAM_TOKEN_FILE";
const TOKEN_FILE_DEFAULT: &str = "token.txt";

const CHART_URL_VAR: &str = "YAHOO_CHART_URL";
const SUMMARY_URL_VAR: &str = "YAHOO_SUMMARY_URL";
const TIMEOUT_VAR: &str = "MARKET_DATA_TIMEOUT_SECS";

pub const CHART_URL_DEFAULT: &str = "https://query1.finance.yahoo.com";
pub const SUMMARY_URL_DEFAULT: &str = "https://query2.finance.yahoo.com";
pub const TIMEOUT_DEFAULT_SECS: u64 = 10;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Set TELEGRAM_BOT_TOKEN environment variable or create token.txt")]
    MissingToken,
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub chart_url: String,
    pub summary_url: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let token_file = env::var(TOKEN_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(TOKEN_FILE_DEFAULT));
        let token = load_token(env::var(TOKEN_VAR).ok(), &token_file)?;

        let timeout = match env::var(TIMEOUT_VAR) {
            Ok(value) => parse_timeout(&value)?,
            Err(_) => Duration::from_secs(TIMEOUT_DEFAULT_SECS),
        };

        Ok(Config {
            token,
            chart_url: env::var(CHART_URL_VAR).unwrap_or_else(|_| CHART_URL_DEFAULT.to_string()),
            summary_url: env::var(SUMMARY_URL_VAR)
                .unwrap_or_else(|_| SUMMARY_URL_DEFAULT.to_string()),
            timeout,
        })
    }
}

// Environment token wins; otherwise the trimmed contents of the token file.
pub fn load_token(env_token: Option<String>, token_file: &Path) -> Result<String, ConfigError> {
    if let Some(token) = env_token.filter(|token| !token.trim().is_empty()) {
        return Ok(token);
    }

    match fs::read_to_string(token_file) {
        Ok(contents) if !contents.trim().is_empty() => Ok(contents.trim().to_string()),
        Ok(_) => Err(ConfigError::MissingToken),
        Err(err) => {
            log::debug!(
                "Config - Token file {} not readable: {err}",
                token_file.display()
            );
            Err(ConfigError::MissingToken)
        }
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue(
            TIMEOUT_VAR.to_string(),
            value.to_string(),
        )),
    }
}
