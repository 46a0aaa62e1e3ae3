use thiserror::Error;

/// A trace line that could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected 4 fields (time, kind, address, size), found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid timestamp '{value}', expected '<seconds>:<nanoseconds>'")]
    Timestamp { line: usize, value: String },

    #[error("line {line}: timestamp '{value}' overflows 64-bit nanoseconds")]
    TimestampOverflow { line: usize, value: String },

    #[error("line {line}: invalid event kind '{value}', expected '+' or '-'")]
    Kind { line: usize, value: String },

    #[error("line {line}: invalid size '{value}'")]
    Size { line: usize, value: String },

    #[error("line {line}: not valid UTF-8")]
    Encoding { line: usize },
}

impl ParseError {
    /// 1-based line number the error was raised for.
    pub fn line(&self) -> usize {
        match self {
            Self::FieldCount { line, .. }
            | Self::Timestamp { line, .. }
            | Self::TimestampOverflow { line, .. }
            | Self::Kind { line, .. }
            | Self::Size { line, .. }
            | Self::Encoding { line } => *line,
        }
    }

    pub(crate) fn at_line(mut self, new_line: usize) -> Self {
        match &mut self {
            Self::FieldCount { line, .. }
            | Self::Timestamp { line, .. }
            | Self::TimestampOverflow { line, .. }
            | Self::Kind { line, .. }
            | Self::Size { line, .. }
            | Self::Encoding { line } => *line = new_line,
        }
        self
    }
}

/// A deallocation (or allocation) that contradicts the events before it.
///
/// `event_index` is the 1-based position of the offending event in the
/// trace. Blank lines are not counted, so it can differ from the line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("event #{event_index}: deallocation of {address} has no open allocation")]
    UnmatchedDeallocation { event_index: usize, address: String },

    #[error("event #{event_index}: deallocation of {address} frees {freed} bytes but {allocated} were allocated")]
    SizeMismatch {
        event_index: usize,
        address: String,
        allocated: u64,
        freed: u64,
    },

    #[error("event #{event_index}: {address} allocated again while still live")]
    DoubleAllocation { event_index: usize, address: String },
}

/// Errors returned by the plotting pipeline and its renderers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("inconsistent trace: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("time bound {max} cannot be rounded up to a multiple of step {step}")]
    BoundsOverflow { max: u64, step: u64 },

    #[error("failed to encode json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
