pub mod config;
pub mod error;
pub mod performance;
pub mod types;

pub use config::{ConfigLoader, LaminateConfig};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use types::{CachePriority, ErrorCategory, ErrorSeverity};
