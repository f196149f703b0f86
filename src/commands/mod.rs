//! Application command handlers for vidrec.
//!
//! # Commands
//! - `record`: Interactive recording session (default)
//! - `play`: Play a saved recording and register a view on the server
//! - `history`: List saved recordings
//! - `list_devices`: List capture devices
//! - `config`: Open the configuration file in the user's editor
//! - `logs`: Display recent log entries

pub mod config;
pub mod history;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;

pub use config::handle_config;
pub use history::handle_history;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;
