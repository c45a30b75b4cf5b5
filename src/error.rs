//! Error types for the Persona Engine
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! "Not enough evidence" is never an error. It is carried as data in the
//! persona record (`DemographicEstimate::InsufficientData`, empty claim lists).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Input errors (3xx)
    InputParse = 300,
    ItemValidation = 301,
    ItemNotFound = 302,

    // Integrity errors (4xx)
    IntegrityViolation = 400,

    // Rule table errors (5xx)
    RulesParse = 500,
    RulesInvalid = 501,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Input errors
            400..=499 => 40, // Integrity errors
            500..=599 => 50, // Rule table errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────

    /// The input document could not be decoded
    #[error("Failed to parse input {source_name}: {message}")]
    InputParse { source_name: String, message: String },

    /// A content item failed ingestion checks
    #[error("Invalid content item{}: {reason}", item_suffix(.item_id))]
    Validation {
        item_id: Option<String>,
        reason: String,
    },

    /// Lookup of an item id that is not in the store
    #[error("Content item not found: {id}")]
    NotFound { id: String },

    // ─────────────────────────────────────────────────────────────
    // Integrity Errors
    // ─────────────────────────────────────────────────────────────

    /// An invariant between pipeline stages was violated
    #[error("Integrity check failed: {message}")]
    Integrity { message: String },

    // ─────────────────────────────────────────────────────────────
    // Rule Table Errors
    // ─────────────────────────────────────────────────────────────

    /// Rule table could not be parsed
    #[error("Failed to parse rule table {origin}: {message}")]
    RulesParse { origin: String, message: String },

    /// Rule table parsed but is not usable
    #[error("Invalid rule table: {message}")]
    RulesInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn item_suffix(item_id: &Option<String>) -> String {
    match item_id {
        Some(id) => format!(" '{}'", id),
        None => String::new(),
    }
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::InternalError,

            Error::InputParse { .. } => ErrorCode::InputParse,
            Error::Validation { .. } => ErrorCode::ItemValidation,
            Error::NotFound { .. } => ErrorCode::ItemNotFound,

            Error::Integrity { .. } => ErrorCode::IntegrityViolation,

            Error::RulesParse { .. } => ErrorCode::RulesParse,
            Error::RulesInvalid { .. } => ErrorCode::RulesInvalid,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error aborts an analysis run
    ///
    /// Lookups of unknown ids are recoverable. Everything that stops the
    /// store from being built or the record from being assembled is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NotFound { .. })
    }

    /// Check if the error indicates a defect in the engine rather than bad input
    pub fn is_defect(&self) -> bool {
        matches!(self, Error::Integrity { .. } | Error::Internal(_))
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'persona-engine config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'persona-engine config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the [analysis] section. Thresholds and caps must be at least 1."
            ),

            Error::InputParse { .. } => Some(
                "The input must be a profile document with 'posts'/'comments' arrays or a Reddit Listing."
            ),
            Error::Validation { .. } => Some(
                "Every post and comment needs a unique, non-empty id and non-empty text."
            ),

            Error::Integrity { .. } => Some(
                "This is a bug in the engine, not in your input. Please report it with the input file."
            ),

            Error::RulesParse { .. } => Some(
                "Check the rule table syntax. Run 'persona-engine rules init' to write the bundled table as a starting point."
            ),
            Error::RulesInvalid { .. } => Some(
                "Run 'persona-engine rules validate --rules <file>' to see which entry is invalid."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an item validation error
    pub fn validation(item_id: Option<&str>, reason: impl Into<String>) -> Self {
        Error::Validation {
            item_id: item_id.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(message: impl Into<String>) -> Self {
        Error::Integrity {
            message: message.into(),
        }
    }

    /// Create an input parse error
    pub fn input_parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InputParse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a rule table validation error
    pub fn rules_invalid(message: impl Into<String>) -> Self {
        Error::RulesInvalid {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
