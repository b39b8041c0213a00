use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Config resolution error: {message}")]
    ConfigResolution { message: String },

    #[error("Similarity input error: expected {expected} dimensions, got {actual}")]
    SimilarityInput { expected: usize, actual: usize },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Generation error: {provider} - {message}")]
    Generation { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn config_resolution(message: impl Into<String>) -> Self {
        Self::ConfigResolution {
            message: message.into(),
        }
    }

    pub fn similarity_input(expected: usize, actual: usize) -> Self {
        Self::SimilarityInput { expected, actual }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error means the backing store could not be reached
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
