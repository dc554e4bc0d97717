use std::sync::LazyLock;

use regex::Regex;

use super::{
    api::{ApiError, CompanyInfo, DiagnosticSink, LookupError, MarketData, Symbol},
    dispatcher::Command,
    format::{format_company, format_day, format_quote, Quote},
    handler::constants::{
        FALLBACK_MESSAGE, HELP_MESSAGE, START_MESSAGE, USAGE_DAY, USAGE_INFO, USAGE_STOCK,
    },
};

/* Processor is the logic center of the bot.
 * It maps each command onto exactly one lookup, formats the result,
 * and decides what the user gets to see when a lookup goes wrong.
 * It never talks to Telegram; the handler sends whatever text is returned.
 */

// A bare message made only of letters, one to five of them.
static IMPLICIT_SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{L}{1,5}$").expect("implicit symbol pattern is valid")
});

const FEATURE_STOCK: &str = "Stock";
const FEATURE_INFO: &str = "Info";
const FEATURE_DAY: &str = "Day";

/* Utility functions */

// Returns the symbol a free-text message stands for, if any.
pub fn implicit_symbol(text: &str) -> Option<Symbol> {
    let text = text.to_uppercase();
    if IMPLICIT_SYMBOL.is_match(&text) {
        Symbol::from_args(&text)
    } else {
        None
    }
}

fn no_data_message(symbol: &Symbol) -> String {
    format!("No data found for {symbol}")
}

fn fetch_error_message(symbol: &Symbol) -> String {
    format!("Error fetching data for {symbol}")
}

fn info_error_message(symbol: &Symbol) -> String {
    format!("Error fetching info for {symbol}")
}

/* Command processing */

// Produces the reply for a slash-command.
pub async fn process_command(
    cmd: Command,
    market: &dyn MarketData,
    sink: &dyn DiagnosticSink,
) -> String {
    match cmd {
        Command::Start => START_MESSAGE.to_string(),
        Command::Help => HELP_MESSAGE.to_string(),
        Command::Stock(args) => match Symbol::from_args(&args) {
            Some(symbol) => lookup_stock(&symbol, market, sink).await,
            None => USAGE_STOCK.to_string(),
        },
        Command::Info(args) => match Symbol::from_args(&args) {
            Some(symbol) => lookup_info(&symbol, market, sink).await,
            None => USAGE_INFO.to_string(),
        },
        Command::Day(args) => match Symbol::from_args(&args) {
            Some(symbol) => lookup_day(&symbol, market, sink).await,
            None => USAGE_DAY.to_string(),
        },
    }
}

// Produces the reply for a free-text message.
pub async fn process_text(
    text: &str,
    market: &dyn MarketData,
    sink: &dyn DiagnosticSink,
) -> String {
    match implicit_symbol(text) {
        Some(symbol) => lookup_stock(&symbol, market, sink).await,
        None => FALLBACK_MESSAGE.to_string(),
    }
}

async fn lookup_stock(
    symbol: &Symbol,
    market: &dyn MarketData,
    sink: &dyn DiagnosticSink,
) -> String {
    let session = match market.session(symbol).await {
        Ok(session) => session,
        Err(LookupError::Empty) => return no_data_message(symbol),
        Err(LookupError::Failure(cause)) => {
            sink.fetch_failed(FEATURE_STOCK, symbol, &cause);
            return fetch_error_message(symbol);
        }
    };

    match Quote::from_session(&session) {
        Some(quote) => format_quote(symbol, &quote),
        None => {
            let cause = ApiError::Malformed("previous close is zero".to_string());
            sink.fetch_failed(FEATURE_STOCK, symbol, &cause);
            fetch_error_message(symbol)
        }
    }
}

async fn lookup_info(
    symbol: &Symbol,
    market: &dyn MarketData,
    sink: &dyn DiagnosticSink,
) -> String {
    match market.company(symbol).await {
        Ok(profile) => format_company(&CompanyInfo::resolve(symbol, profile)),
        Err(LookupError::Empty) => no_data_message(symbol),
        Err(LookupError::Failure(cause)) => {
            sink.fetch_failed(FEATURE_INFO, symbol, &cause);
            info_error_message(symbol)
        }
    }
}

async fn lookup_day(
    symbol: &Symbol,
    market: &dyn MarketData,
    sink: &dyn DiagnosticSink,
) -> String {
    match market.session(symbol).await {
        Ok(session) => format_day(symbol, &session),
        Err(LookupError::Empty) => no_data_message(symbol),
        Err(LookupError::Failure(cause)) => {
            sink.fetch_failed(FEATURE_DAY, symbol, &cause);
            fetch_error_message(symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use async_trait::async_trait;

    use super::{implicit_symbol, process_command, process_text};
    use crate::bot::{
        api::{
            ApiError, CompanyProfile, DiagnosticSink, LookupError, LookupResult, MarketData,
            Ratio, Session, Symbol,
        },
        dispatcher::Command,
    };

    #[derive(Clone, Copy)]
    enum Outcome {
        Found,
        Empty,
        Failure,
    }

    // In-memory provider that counts and records every lookup.
    struct FakeMarket {
        outcome: Outcome,
        session: Session,
        profile: CompanyProfile,
        calls: AtomicUsize,
        symbols: Mutex<Vec<String>>,
    }

    impl FakeMarket {
        fn new(outcome: Outcome) -> FakeMarket {
            FakeMarket {
                outcome,
                session: Session {
                    close: 190.0,
                    previous_close: Some(187.5),
                    high: 191.25,
                    low: 186.0,
                    volume: 1234567,
                },
                profile: CompanyProfile {
                    name: Some("Apple Inc.".to_string()),
                    sector: Some("Technology".to_string()),
                    market_cap: Some(2.5e12),
                    pe_ratio: Some(Ratio::Number(28.5)),
                },
                calls: AtomicUsize::new(0),
                symbols: Mutex::new(Vec::new()),
            }
        }

        fn with_session(mut self, session: Session) -> FakeMarket {
            self.session = session;
            self
        }

        fn record<T>(&self, symbol: &Symbol, found: T) -> LookupResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.symbols.lock().unwrap().push(symbol.to_string());
            match self.outcome {
                Outcome::Found => Ok(found),
                Outcome::Empty => Err(LookupError::Empty),
                Outcome::Failure => Err(LookupError::Failure(ApiError::Provider(
                    "connection reset by peer".to_string(),
                ))),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketData for FakeMarket {
        async fn session(&self, symbol: &Symbol) -> LookupResult<Session> {
            self.record(symbol, self.session.clone())
        }

        async fn company(&self, symbol: &Symbol) -> LookupResult<CompanyProfile> {
            self.record(symbol, self.profile.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<String>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn fetch_failed(&self, feature: &str, symbol: &Symbol, cause: &ApiError) {
            self.entries
                .lock()
                .unwrap()
                .push(format!("{feature} {symbol} {cause}"));
        }
    }

    impl RecordingSink {
        fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_start_and_help() {
        let market = FakeMarket::new(Outcome::Found);
        let sink = RecordingSink::default();

        let start = process_command(Command::Start, &market, &sink).await;
        assert!(start.starts_with("Welcome to CipherScape!"));
        let help = process_command(Command::Help, &market, &sink).await;
        assert!(help.contains("/day <symbol> - Day's high/low"));
        assert_eq!(market.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_argument_usage() {
        let market = FakeMarket::new(Outcome::Found);
        let sink = RecordingSink::default();

        let cases = [
            (Command::Stock(String::new()), "Usage: /stock SYMBOL"),
            (Command::Info(" ".to_string()), "Usage: /info SYMBOL"),
            (Command::Day(String::new()), "Usage: /day SYMBOL"),
        ];
        for (cmd, expected) in cases {
            assert_eq!(process_command(cmd, &market, &sink).await, expected);
        }
        assert_eq!(market.calls(), 0);
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_stock_lookup() {
        let market = FakeMarket::new(Outcome::Found);
        let sink = RecordingSink::default();

        let reply = process_command(Command::Stock("aapl".to_string()), &market, &sink).await;
        assert_eq!(reply, "📈 AAPL\n\nPrice: $190.00\nChange: +$2.50 (+1.33%)");
        assert_eq!(*market.symbols.lock().unwrap(), vec!["AAPL".to_string()]);
    }

    #[tokio::test]
    async fn test_stock_without_previous_close() {
        let market = FakeMarket::new(Outcome::Found).with_session(Session {
            close: 50.0,
            previous_close: None,
            high: 51.0,
            low: 49.0,
            volume: 10,
        });
        let sink = RecordingSink::default();

        let reply = process_command(Command::Stock("nvda".to_string()), &market, &sink).await;
        assert_eq!(reply, "📈 NVDA\n\nPrice: $50.00\nChange: +$0.00 (+0.00%)");
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_stock_zero_previous_close_is_failure() {
        let market = FakeMarket::new(Outcome::Found).with_session(Session {
            close: 1.0,
            previous_close: Some(0.0),
            high: 1.0,
            low: 1.0,
            volume: 1,
        });
        let sink = RecordingSink::default();

        let reply = process_command(Command::Stock("odd".to_string()), &market, &sink).await;
        assert_eq!(reply, "Error fetching data for ODD");
        assert_eq!(sink.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_stock_no_data() {
        let market = FakeMarket::new(Outcome::Empty);
        let sink = RecordingSink::default();

        let reply = process_command(Command::Stock("AAPL".to_string()), &market, &sink).await;
        assert_eq!(reply, "No data found for AAPL");
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_day_failure_hides_cause() {
        let market = FakeMarket::new(Outcome::Failure);
        let sink = RecordingSink::default();

        let reply = process_command(Command::Day("MSFT".to_string()), &market, &sink).await;
        assert_eq!(reply, "Error fetching data for MSFT");
        assert!(!reply.contains("connection reset"));

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].contains("MSFT"));
        assert!(entries[0].contains("connection reset by peer"));
    }

    #[tokio::test]
    async fn test_day_lookup() {
        let market = FakeMarket::new(Outcome::Found);
        let sink = RecordingSink::default();

        let reply = process_command(Command::Day("msft".to_string()), &market, &sink).await;
        assert_eq!(
            reply,
            "📅 MSFT Today\n\nHigh: $191.25\nLow: $186.00\nVolume: 1,234,567"
        );
    }

    #[tokio::test]
    async fn test_info_lookup() {
        let market = FakeMarket::new(Outcome::Found);
        let sink = RecordingSink::default();

        let reply = process_command(Command::Info("aapl".to_string()), &market, &sink).await;
        assert_eq!(
            reply,
            "📊 Apple Inc. (AAPL)\n\nSector: Technology\nMarket Cap: $2.50T\nP/E Ratio: 28.5"
        );
    }

    #[tokio::test]
    async fn test_info_failure() {
        let market = FakeMarket::new(Outcome::Failure);
        let sink = RecordingSink::default();

        let reply = process_command(Command::Info("goog".to_string()), &market, &sink).await;
        assert_eq!(reply, "Error fetching info for GOOG");
        assert_eq!(sink.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_info_no_data() {
        let market = FakeMarket::new(Outcome::Empty);
        let sink = RecordingSink::default();

        let reply = process_command(Command::Info("QQQQQ".to_string()), &market, &sink).await;
        assert_eq!(reply, "No data found for QQQQQ");
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_implicit_matches_stock_command() {
        for text in ["a", "aapl", "Msft", "GOOGL"] {
            let market = FakeMarket::new(Outcome::Found);
            let sink = RecordingSink::default();

            let implicit = process_text(text, &market, &sink).await;
            let explicit = process_command(Command::Stock(text.to_string()), &market, &sink).await;
            assert_eq!(implicit, explicit);
            assert_eq!(market.calls(), 2);
        }
    }

    #[tokio::test]
    async fn test_other_text_falls_back() {
        let market = FakeMarket::new(Outcome::Found);
        let sink = RecordingSink::default();

        for text in ["", "toolong", "BRK.B", "AB1", "hello there", " aapl", "12345"] {
            assert_eq!(
                process_text(text, &market, &sink).await,
                "Send a stock symbol or use /help"
            );
        }
        assert_eq!(market.calls(), 0);
    }

    #[test]
    fn test_implicit_symbol() {
        assert_eq!(
            implicit_symbol("tsla").map(|s| s.to_string()),
            Some("TSLA".to_string())
        );
        assert!(implicit_symbol("abcdef").is_none());
        assert!(implicit_symbol("a b").is_none());
        assert!(implicit_symbol("").is_none());
    }
}
