//! Callback payload parse errors

/// Errors produced while decoding an inbound callback payload.
///
/// Decoding is strict: anything that would not re-encode to the exact same
/// payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The payload is longer than the platform allows.
    #[error("Callback payload is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    /// The payload lacks the kind, action, token or generation field.
    #[error("Callback payload has {0} field(s), expected at least 4")]
    TooFewFields(usize),

    /// The kind prefix does not belong to any widget.
    #[error("Unknown widget kind prefix '{0}'")]
    UnknownKind(String),

    /// The action tag is not known for this widget kind.
    #[error("Unknown {kind} action '{tag}'")]
    UnknownAction { kind: &'static str, tag: String },

    /// The action was given the wrong number of arguments.
    #[error("Action '{tag}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        tag: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A numeric field is not a canonical integer.
    #[error("Invalid {field} value '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    /// A numeric field is outside the range the action accepts.
    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: i64 },

    /// The identity token is empty or uses characters outside the alphabet.
    #[error("Invalid token '{0}'")]
    InvalidToken(String),

    /// Year, month and day do not form a calendar date.
    #[error("Invalid date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// A string argument is empty.
    #[error("Empty {0} argument")]
    EmptyArgument(&'static str),

    /// The payload belongs to a different widget kind.
    #[error("Expected a {expected} payload, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl ParseError {
    /// Creates a new invalid number error.
    pub fn invalid_number(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            field,
            value: value.into(),
        }
    }

    /// Creates a new unknown action error.
    pub fn unknown_action(kind: &'static str, tag: impl Into<String>) -> Self {
        Self::UnknownAction {
            kind,
            tag: tag.into(),
        }
    }
}
