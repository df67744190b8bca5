//! Infrastructure layer - filesystem adapters.
//!
//! This layer handles all I/O operations: config files, the domain list,
//! the cursor file and the measurement log.

pub mod append_log;
pub mod config;
pub mod cursor_file;
pub mod domain_list;

pub use append_log::AppendLog;
pub use config::{ensure_config_exists, load_config};
pub use cursor_file::CursorFile;
pub use domain_list::load_domains;
