/// Result alias that carries the custom [`RhythmError`] type.
pub type Result<T> = std::result::Result<T, RhythmError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum RhythmError {
    /// The score file is missing, unreadable or not a valid MIDI container.
    /// Fatal to startup: no partial schedule is ever produced.
    #[error("failed to load chart: {0}")]
    ChartLoad(String),
    /// The symbol table contained no usable cells.
    #[error("symbol sequence is empty")]
    EmptySequence,
    /// A scheduled symbol has no playable note configuration. Raised at spawn
    /// time and only logged; the affected note is skipped.
    #[error("no playable note configured for symbol `{0}`")]
    UnknownSymbol(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl RhythmError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for RhythmError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for RhythmError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
