use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// A stage candidate was rejected by validation and rolled back.
    ValidationError,
    /// A layer transform raised instead of returning a candidate.
    TransformError,
    /// Source could not be parsed; validation falls back to the fast path.
    ParseError,
    /// A worker chunk exceeded its wall-clock budget.
    TimeoutError,
    /// Malformed top-level input (empty file set, invalid options).
    InputError,
    ConfigError,
    SerializationError,
    IoError,
    InternalError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// Cache entry priority used by scored eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CachePriority {
    Low,
    #[default]
    Normal,
    High,
}

impl CachePriority {
    /// Weight applied by the staged eviction score.
    pub fn weight(&self) -> f64 {
        match self {
            CachePriority::Low => 1.0,
            CachePriority::Normal => 2.0,
            CachePriority::High => 3.0,
        }
    }
}
