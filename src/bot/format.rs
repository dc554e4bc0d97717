use super::api::{CompanyInfo, Session, Symbol};

/* Format turns market data into the text blocks sent back to users.
 * Every function here is pure: same data in, same message out.
 */

const TRILLION: f64 = 1e12;
const BILLION: f64 = 1e9;
const MILLION: f64 = 1e6;

const EMOJI_GAIN: &str = "📈";
const EMOJI_LOSS: &str = "📉";

// Price movement against the previous close.
#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub change: f64,
    pub change_pct: f64,
}

impl Quote {
    /* Derives change figures from a session.
     * A missing previous close falls back to the price itself, giving zero change.
     * Returns None when the previous close is zero, since no percentage exists.
     */
    pub fn from_session(session: &Session) -> Option<Quote> {
        let price = session.close;
        let previous_close = session.previous_close.unwrap_or(price);
        if previous_close == 0.0 {
            return None;
        }

        let change = price - previous_close;
        Some(Quote {
            price,
            change,
            change_pct: change / previous_close * 100.0,
        })
    }

    // Zero change counts as a gain.
    pub fn is_gain(&self) -> bool {
        self.change >= 0.0
    }
}

pub fn format_quote(symbol: &Symbol, quote: &Quote) -> String {
    let (emoji, sign) = if quote.is_gain() {
        (EMOJI_GAIN, "+")
    } else {
        (EMOJI_LOSS, "")
    };

    format!(
        "{emoji} {symbol}\n\nPrice: ${:.2}\nChange: {sign}${:.2} ({sign}{:.2}%)",
        quote.price, quote.change, quote.change_pct
    )
}

pub fn format_company(info: &CompanyInfo) -> String {
    format!(
        "📊 {} ({})\n\nSector: {}\nMarket Cap: {}\nP/E Ratio: {}",
        info.name,
        info.symbol,
        info.sector,
        format_market_cap(info.market_cap),
        info.pe_ratio
    )
}

pub fn format_day(symbol: &Symbol, session: &Session) -> String {
    format!(
        "📅 {symbol} Today\n\nHigh: ${:.2}\nLow: ${:.2}\nVolume: {}",
        session.high,
        session.low,
        format_volume(session.volume)
    )
}

// Scales a market cap to T/B/M. Thresholds are inclusive and applied before rounding.
pub fn format_market_cap(market_cap: f64) -> String {
    if market_cap >= TRILLION {
        format!("${:.2}T", market_cap / TRILLION)
    } else if market_cap >= BILLION {
        format!("${:.2}B", market_cap / BILLION)
    } else {
        format!("${:.2}M", market_cap / MILLION)
    }
}

// Thousands-grouped integer, e.g. 1,234,567.
pub fn format_volume(volume: u64) -> String {
    let digits = volume.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
