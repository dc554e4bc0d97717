use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, StatusCode, Url,
};
use serde::Deserialize;

use super::{
    api::{
        ApiError, CompanyProfile, LookupError, LookupResult, MarketData, Ratio, Session, Symbol,
    },
    config::Config,
};

/* Yahoo Finance implementation of MarketData.
 * Sessions come from the chart endpoint, company profiles from quoteSummary.
 * quoteSummary only answers with a crumb bound to a session cookie,
 * so each profile lookup first performs that handshake.
 */

const COOKIE_URL: &str = "https://fc.yahoo.com";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const SUMMARY_MODULES: &str = "price,summaryProfile,summaryDetail";
const NOT_FOUND_CODE: &str = "Not Found";

pub struct YahooClient {
    client: Client,
    chart_url: String,
    summary_url: String,
}

impl YahooClient {
    pub fn new(
        chart_url: String,
        summary_url: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            chart_url,
            summary_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.chart_url.clone(),
            config.summary_url.clone(),
            config.timeout,
        )
    }

    async fn fetch_crumb(&self) -> Result<String, ApiError> {
        // Only the cookie matters; this endpoint answers 404 by design.
        self.client.get(COOKIE_URL).send().await?;

        let crumb = self
            .client
            .get(endpoint(&self.summary_url, &["v1", "test", "getcrumb"])?)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if crumb.is_empty() || crumb.contains('<') {
            return Err(ApiError::Provider("no crumb issued".to_string()));
        }
        Ok(crumb)
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn session(&self, symbol: &Symbol) -> LookupResult<Session> {
        let symbol = symbol.to_string();
        let url = endpoint(&self.chart_url, &["v8", "finance", "chart", symbol.as_str()])?;

        let response = self
            .client
            .get(url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_chart(status, &body)
    }

    async fn company(&self, symbol: &Symbol) -> LookupResult<CompanyProfile> {
        let crumb = self.fetch_crumb().await?;
        let symbol = symbol.to_string();
        let url = endpoint(
            &self.summary_url,
            &["v10", "finance", "quoteSummary", symbol.as_str()],
        )?;

        let response = self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_summary(status, &body)
    }
}

// Appends path segments to a base URL. Each segment is escaped, so a symbol stays one segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = Url::parse(base)
        .map_err(|err| ApiError::Provider(format!("invalid base url {base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Provider(format!("invalid base url {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

//
// Match Yahoo Finance JSON
//
#[derive(Debug, Deserialize)]
struct ProviderError {
    code: Option<String>,
    description: Option<String>,
}

// Turns the error block of a response into Empty or Failure.
fn provider_error(status: StatusCode, error: Option<ProviderError>) -> LookupError {
    match error {
        Some(error) if error.code.as_deref() == Some(NOT_FOUND_CODE) => LookupError::Empty,
        Some(error) => LookupError::Failure(ApiError::Provider(format!(
            "{status}: {}",
            error
                .description
                .or(error.code)
                .unwrap_or_else(|| "unknown error".to_string())
        ))),
        None if status == StatusCode::NOT_FOUND => LookupError::Empty,
        None if !status.is_success() => {
            LookupError::Failure(ApiError::Provider(status.to_string()))
        }
        None => LookupError::Empty,
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Bars>,
}

#[derive(Debug, Default, Deserialize)]
struct Bars {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn parse_chart(status: StatusCode, body: &str) -> LookupResult<Session> {
    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status == StatusCode::NOT_FOUND => return Err(LookupError::Empty),
        Err(_) if !status.is_success() => {
            return Err(ApiError::Provider(status.to_string()).into())
        }
        Err(err) => return Err(ApiError::from(err).into()),
    };

    let Some(result) = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Err(provider_error(status, envelope.chart.error));
    };

    let bars = result
        .indicators
        .and_then(|indicators| indicators.quote.into_iter().next())
        .unwrap_or_default();

    // Latest bar with a close; earlier nulls are trading gaps.
    let Some((index, close)) = bars
        .close
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, close)| close.map(|close| (index, close)))
    else {
        return Err(LookupError::Empty);
    };

    let at = |series: &[Option<f64>], name: &str| -> Result<f64, ApiError> {
        series
            .get(index)
            .copied()
            .flatten()
            .ok_or_else(|| ApiError::Malformed(format!("missing {name} for latest session")))
    };

    Ok(Session {
        close,
        previous_close: result
            .meta
            .previous_close
            .or(result.meta.chart_previous_close),
        high: at(&bars.high, "high")?,
        low: at(&bars.low, "low")?,
        volume: bars.volume.get(index).copied().flatten().unwrap_or(0.0).max(0.0) as u64,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<SummaryResult>>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    price: Option<PriceModule>,
    summary_profile: Option<ProfileModule>,
    summary_detail: Option<DetailModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct ProfileModule {
    sector: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
}

// Yahoo wraps numbers as {"raw": .., "fmt": ..}, or {} when unknown.
// raw is usually a number but can be a string such as "Infinity".
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<serde_json::Value>,
}

impl RawValue {
    fn number(self) -> Option<f64> {
        self.raw.and_then(|raw| raw.as_f64())
    }

    // Numbers and strings pass through; any other shape counts as absent.
    fn ratio(self) -> Option<Ratio> {
        match self.raw? {
            serde_json::Value::Number(number) => number.as_f64().map(Ratio::Number),
            serde_json::Value::String(text) => Some(Ratio::Text(text)),
            _ => None,
        }
    }
}

fn parse_summary(status: StatusCode, body: &str) -> LookupResult<CompanyProfile> {
    let envelope: SummaryEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status == StatusCode::NOT_FOUND => return Err(LookupError::Empty),
        Err(_) if !status.is_success() => {
            return Err(ApiError::Provider(status.to_string()).into())
        }
        Err(err) => return Err(ApiError::from(err).into()),
    };

    let Some(result) = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Err(provider_error(status, envelope.quote_summary.error));
    };

    let (name, market_cap) = match result.price {
        Some(price) => (
            price.long_name.filter(|name| !name.is_empty()),
            price.market_cap.and_then(RawValue::number),
        ),
        None => (None, None),
    };

    Ok(CompanyProfile {
        name,
        sector: result
            .summary_profile
            .and_then(|profile| profile.sector)
            .filter(|sector| !sector.is_empty()),
        market_cap,
        pe_ratio: result
            .summary_detail
            .and_then(|detail| detail.trailing_pe)
            .and_then(RawValue::ratio),
    })
}
