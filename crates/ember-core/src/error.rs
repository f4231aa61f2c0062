//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Unknown behavior type: {0}")]
    UnknownBehavior(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Unknown texture: {0}")]
    UnknownTexture(String),

    #[error("Expression parse error: {0}")]
    ExpressionParse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl EmberError {
    /// True for errors raised while interpreting an emitter configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EmberError::Configuration(_)
                | EmberError::MissingRequiredField(_)
                | EmberError::UnknownBehavior(_)
                | EmberError::ValueOutOfRange { .. }
                | EmberError::InvalidColor(_)
                | EmberError::UnknownTexture(_)
        )
    }
}

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParseError(err.to_string())
    }
}

impl From<serde_json::Error> for EmberError {
    fn from(err: serde_json::Error) -> Self {
        EmberError::JsonParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_family() {
        assert!(EmberError::UnknownBehavior("sparkle".into()).is_configuration());
        assert!(EmberError::InvalidColor("#zz".into()).is_configuration());
        assert!(!EmberError::ExpressionParse("x +".into()).is_configuration());
    }

    #[test]
    fn toml_error_converts() {
        let err: EmberError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, EmberError::TomlParseError(_)));
    }
}
