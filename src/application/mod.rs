//! Application layer - use cases and orchestration.
//!
//! This layer contains the dispensing cursor and the service that ties it
//! to the measurement log.

pub mod cursor_store;
pub mod dispatcher;
pub mod formatter;

pub use cursor_store::CursorStore;
pub use dispatcher::Dispatcher;
pub use formatter::{format_domain_json, format_status_json, format_status_table};
