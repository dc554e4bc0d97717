// Exported functions
pub use self::general::{action_command, action_text, invalid_state};

// Submodules
pub mod constants;
mod general;
mod utils;
