//! Error handling for Plate-Gate

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
///
/// The taxonomy matters operationally: `Io` on append aborts only the
/// current candidate, `CorruptLog` refuses startup, `Actuator` and
/// `Mirror` are logged-only, `Device` terminates the recognition loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (durable log read/write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encode/decode error on the durable log
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Corrupt durable log at startup (fatal, never skipped)
    #[error("Corrupt registry log at line {line}: {reason}")]
    CorruptLog { line: usize, reason: String },

    /// Barrier actuator failure (non-fatal, logged only)
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Secondary mirror failure (non-fatal, logged only)
    #[error("Mirror error: {0}")]
    Mirror(#[from] sqlx::Error),

    /// Upstream capture device failure (fatal to the loop)
    #[error("Capture device error: {0}")]
    Device(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}
