use thiserror::Error;

/// Errors raised while loading or validating service configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigurationError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigurationError::invalid("lot.capacity", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'lot.capacity': must be at least 1"
        );
    }
}
