//! Construction-time configuration errors

/// Errors raised while building a widget, registry or router.
///
/// These are reported synchronously by the builders and never replaced by a
/// silent default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The language code is not one of the bundled translations.
    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),

    /// A paginator was built without eager data or a lazy loader.
    #[error("Paginator requires either eager data or a lazy loader")]
    MissingData,

    /// A paginator was given both eager data and a lazy loader.
    #[error("Only one of eager data or a lazy loader may be provided")]
    ConflictingData,

    /// A lazy paginator was built without a count source.
    #[error("Lazy paginator data requires a count source")]
    MissingCount,

    /// A count source was given alongside eager data.
    #[error("Eager paginator data determines its own count")]
    UnexpectedCount,

    /// A numeric setting is outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
        value: usize,
    },

    /// The token space is too small for the requested registry capacity.
    #[error("Token length {token_length} cannot address a registry of {capacity} entries")]
    TokenSpaceTooSmall { token_length: usize, capacity: usize },

    /// A checkbox option key cannot be carried in a callback payload.
    #[error("Invalid option key '{key}': {reason}")]
    InvalidOptionKey { key: String, reason: &'static str },

    /// The same checkbox option key was supplied twice.
    #[error("Duplicate option key '{0}'")]
    DuplicateOption(String),

    /// A checkbox was built without options.
    #[error("At least one option is required")]
    NoOptions,

    /// The minute step is zero, above 30 or does not divide an hour.
    #[error("Minute step {0} does not divide an hour")]
    InvalidStep(u32),

    /// An initial time is not a valid wall-clock time.
    #[error("Invalid time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

impl ConfigError {
    /// Creates a new out-of-range error.
    pub fn out_of_range(field: &'static str, min: usize, max: usize, value: usize) -> Self {
        Self::OutOfRange {
            field,
            min,
            max,
            value,
        }
    }

    /// Creates a new invalid option key error.
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidOptionKey {
            key: key.into(),
            reason,
        }
    }

    /// Checks that `value` lies in `min..=max`.
    pub(crate) fn check_range(
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    ) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::out_of_range(field, min, max, value))
        }
    }
}
