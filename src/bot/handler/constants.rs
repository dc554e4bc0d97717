/* Fixed texts shown to users. */

pub const START_MESSAGE: &str = "Welcome to CipherScape!\n\n\
Commands:\n\
/stock AAPL - Get stock price\n\
/info AAPL - Get company info\n\
/help - Show commands";

pub const HELP_MESSAGE: &str = "Available commands:\n\n\
/start - Welcome message\n\
/stock <symbol> - Current stock price\n\
/info <symbol> - Company information\n\
/day <symbol> - Day's high/low\n\
/help - This message";

pub const FALLBACK_MESSAGE: &str = "Send a stock symbol or use /help";

pub const USAGE_STOCK: &str = "Usage: /stock SYMBOL";
pub const USAGE_INFO: &str = "Usage: /info SYMBOL";
pub const USAGE_DAY: &str = "Usage: /day SYMBOL";
