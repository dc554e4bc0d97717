use std::fmt;

use async_trait::async_trait;

/* API defines the boundary between the bot and its market-data provider.
 * The Processor only ever talks to a MarketData, never to a concrete provider.
 * Optional provider fields are resolved into display defaults here,
 * so that formatting never has to deal with missing keys.
 */

/* Types */

// Ticker symbol, always upper-case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol(String);

impl Symbol {
    // Builds a symbol from a command argument. Only the first token counts.
    pub fn from_args(args: &str) -> Option<Symbol> {
        args.split_whitespace()
            .next()
            .map(|token| Symbol(token.to_uppercase()))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Most recent trading session for a symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub close: f64,
    pub previous_close: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

// Company metadata as returned by the provider, every field optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<Ratio>,
}

// A ratio as the provider sent it: usually a number, sometimes a literal like "Infinity".
#[derive(Clone, Debug, PartialEq)]
pub enum Ratio {
    Number(f64),
    Text(String),
}

// Company metadata with defaults applied.
#[derive(Clone, Debug, PartialEq)]
pub struct CompanyInfo {
    pub symbol: Symbol,
    pub name: String,
    pub sector: String,
    pub market_cap: f64,
    pub pe_ratio: String,
}

const FIELD_DEFAULT: &str = "N/A";

impl CompanyInfo {
    pub fn resolve(symbol: &Symbol, profile: CompanyProfile) -> CompanyInfo {
        CompanyInfo {
            symbol: symbol.clone(),
            name: profile.name.unwrap_or_else(|| symbol.to_string()),
            sector: profile.sector.unwrap_or_else(|| FIELD_DEFAULT.to_string()),
            market_cap: profile.market_cap.unwrap_or(0.0),
            pe_ratio: profile
                .pe_ratio
                .map(|ratio| match ratio {
                    Ratio::Number(number) => display_ratio(number),
                    Ratio::Text(text) => text,
                })
                .unwrap_or_else(|| FIELD_DEFAULT.to_string()),
        }
    }
}

// Prints a ratio as the provider reported it, keeping a trailing ".0" on whole numbers.
fn display_ratio(ratio: f64) -> String {
    if ratio.is_finite() && ratio.fract() == 0.0 {
        format!("{ratio:.1}")
    } else {
        format!("{ratio}")
    }
}

/* Errors */

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(reqwest::Error),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(request_error: reqwest::Error) -> ApiError {
        ApiError::Request(request_error)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(json_error: serde_json::Error) -> ApiError {
        ApiError::Malformed(json_error.to_string())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("No data available")]
    Empty,
    #[error("{0}")]
    Failure(ApiError),
}

impl From<ApiError> for LookupError {
    fn from(api_error: ApiError) -> LookupError {
        LookupError::Failure(api_error)
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(request_error: reqwest::Error) -> LookupError {
        LookupError::Failure(ApiError::Request(request_error))
    }
}

pub type LookupResult<T> = Result<T, LookupError>;

/* Collaborators */

// Source of market data. Implementations must report unknown symbols as Empty.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn session(&self, symbol: &Symbol) -> LookupResult<Session>;

    async fn company(&self, symbol: &Symbol) -> LookupResult<CompanyProfile>;
}

// Receives operator diagnostics for failed lookups.
pub trait DiagnosticSink: Send + Sync {
    fn fetch_failed(&self, feature: &str, symbol: &Symbol, cause: &ApiError);
}

// Diagnostic sink writing through the log facade.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn fetch_failed(&self, feature: &str, symbol: &Symbol, cause: &ApiError) {
        log::error!("{feature} - Error fetching {symbol}: {cause}");
    }
}
