//! Command handler modules
//!
//! One module per CLI command. Handlers that can fail in a user-visible way
//! return the process exit code.

pub mod config;
pub mod health;
pub mod init;
pub mod log_entry;

pub use config::{handle_config_show, handle_config_update, ConfigUpdate};
pub use health::handle_health;
pub use init::handle_init;
pub use log_entry::{handle_log, LogInput};

/// Exit code for rejected input (the HTTP 422 analogue).
pub const EXIT_INVALID_INPUT: i32 = 2;
