//! Domain layer - core types and error definitions.
//!
//! This layer contains pure domain models, configuration and the
//! persistence seam, without any filesystem access.

pub mod config;
pub mod cursor;
pub mod error;
pub mod models;

pub use config::AppConfig;
pub use cursor::{parse_position, CursorPersistence};
pub use error::{AppError, Result};
pub use models::{DispenserStatus, DomainItem};
