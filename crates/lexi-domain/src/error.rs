//! Error handling types for the core orchestration domain.

use thiserror::Error;

/// Result type alias for operations that can fail with a domain [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type shared by the domain, application, infrastructure, and
/// provider crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid argument supplied to a domain operation
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// The requested state transition violates a lifecycle invariant
    #[error("Invalid state transition: {message}")]
    InvalidTransition {
        /// Description of the violated invariant
        message: String,
    },

    /// Caller does not own the resource they are trying to access
    #[error("Ownership mismatch: {message}")]
    Ownership {
        /// Description of the mismatch
        message: String,
    },

    /// Configuration error (simple)
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Invalid configuration value for a specific key
    #[error("Invalid configuration for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key that is invalid
        key: String,
        /// Reason why it is invalid
        message: String,
    },

    /// Missing configuration field
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    /// Database-related error
    #[error("Database error: {message}")]
    Database {
        /// Description of the database error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM client error (any tier)
    #[error("LLM error: {message}")]
    Llm {
        /// Description of the LLM error
        message: String,
        /// Symbolic taxonomy code (e.g. `RATE_LIMIT`, `API_ERROR`)
        code: String,
        /// Whether the failure is retryable by the next tier
        retryable: bool,
    },

    /// PDF extraction error
    #[error("PDF error: {message}")]
    Pdf {
        /// Description of the PDF error
        message: String,
    },

    /// Task dispatcher / broker error
    #[error("Dispatcher error: {message}")]
    Dispatcher {
        /// Description of the dispatcher error
        message: String,
    },

    /// Progress bus / push channel error
    #[error("Progress bus error: {message}")]
    ProgressBus {
        /// Description of the error
        message: String,
    },

    /// Export (spreadsheet) client error
    #[error("Export error: {message}")]
    Export {
        /// Description of the export error
        message: String,
    },

    /// Authentication / authorization error
    #[error("Authentication error: {message}")]
    Authentication {
        /// Description of the authentication error
        message: String,
    },

    /// Infrastructure error (catch-all for adapters)
    #[error("Infrastructure error: {message}")]
    Infrastructure {
        /// Description of the infrastructure error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal invariant violation (should not happen)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a not-found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid-state-transition error
    pub fn invalid_transition<S: Into<String>>(message: S) -> Self {
        Self::InvalidTransition {
            message: message.into(),
        }
    }

    /// Create an ownership-mismatch error
    pub fn ownership<S: Into<String>>(message: S) -> Self {
        Self::Ownership {
            message: message.into(),
        }
    }

    /// Create a simple configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a database error without a source
    pub fn database<S: Into<String>>(message: S) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Create a database error with a source
    pub fn database_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an LLM error
    pub fn llm<S: Into<String>, C: Into<String>>(message: S, code: C, retryable: bool) -> Self {
        Self::Llm {
            message: message.into(),
            code: code.into(),
            retryable,
        }
    }

    /// Create a PDF error
    pub fn pdf<S: Into<String>>(message: S) -> Self {
        Self::Pdf {
            message: message.into(),
        }
    }

    /// Create a dispatcher error
    pub fn dispatcher<S: Into<String>>(message: S) -> Self {
        Self::Dispatcher {
            message: message.into(),
        }
    }

    /// Create a progress-bus error
    pub fn progress_bus<S: Into<String>>(message: S) -> Self {
        Self::ProgressBus {
            message: message.into(),
        }
    }

    /// Create an export error
    pub fn export<S: Into<String>>(message: S) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an infrastructure error without a source
    pub fn infrastructure<S: Into<String>>(message: S) -> Self {
        Self::Infrastructure {
            message: message.into(),
            source: None,
        }
    }

    /// Create an infrastructure error with a source
    pub fn infrastructure_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Infrastructure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
