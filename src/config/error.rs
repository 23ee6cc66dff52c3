//! Configuration error types for the operation client.

use thiserror::Error;

/// Errors that can occur during configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("Missing required configuration: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// Invalid configuration value or combination.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of the configuration issue.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(err: &ConfigError) -> Option<&str> {
        match err {
            ConfigError::MissingField { field } => Some(field),
            ConfigError::Invalid { .. } => None,
        }
    }

    #[test]
    fn test_display() {
        let missing = ConfigError::MissingField {
            field: "region".to_string(),
        };
        assert_eq!(missing.to_string(), "Missing required configuration: region");
        assert_eq!(field(&missing), Some("region"));

        let invalid = ConfigError::Invalid {
            message: "endpoint must be absolute".to_string(),
        };
        assert_eq!(invalid.to_string(), "Invalid configuration: endpoint must be absolute");
        assert_eq!(field(&invalid), None);
    }
}
