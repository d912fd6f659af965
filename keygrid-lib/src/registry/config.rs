//! Registry configuration

use std::time::Duration;

use crate::error::ConfigError;

use super::TokenGenerator;

/// Longest supported token.
pub const MAX_TOKEN_LENGTH: usize = 8;

/// Capacity, token and timeout settings for an
/// [`InstanceRegistry`](super::InstanceRegistry).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use keygrid_lib::registry::RegistryConfig;
///
/// let config = RegistryConfig::default()
///     .with_capacity(200)
///     .with_token_length(3)
///     .with_request_timeout(Duration::from_millis(300));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of live instances before the oldest is evicted.
    ///
    /// Default: 1000
    pub capacity: usize,

    /// Number of characters in a generated token.
    ///
    /// Default: 4
    pub token_length: usize,

    /// Timeout for platform calls whose failure is tolerated, such as
    /// removing a finished keyboard. Instances read it when built.
    ///
    /// Default: 1 second
    pub request_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            token_length: 4,
            request_timeout: Duration::from_secs(1),
        }
    }
}

impl RegistryConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the token length.
    pub fn with_token_length(mut self, token_length: usize) -> Self {
        self.token_length = token_length;
        self
    }

    /// Sets the best-effort request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Checks the settings.
    ///
    /// The token space must hold at least twice the capacity so that token
    /// generation never degenerates into a long retry loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("capacity", self.capacity, 1, usize::MAX)?;
        ConfigError::check_range("token_length", self.token_length, 1, MAX_TOKEN_LENGTH)?;
        let space = TokenGenerator::new(self.token_length).space();
        if (self.capacity as u128).saturating_mul(2) > space {
            return Err(ConfigError::TokenSpaceTooSmall {
                token_length: self.token_length,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RegistryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = RegistryConfig::default().with_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "capacity", .. })
        ));
    }

    #[test]
    fn test_rejects_small_token_space() {
        let config = RegistryConfig::default().with_token_length(1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::TokenSpaceTooSmall {
                token_length: 1,
                capacity: 1000
            })
        );
    }
}
