use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;
use crate::domain::model::ModelHandle;

/// Trait for the external generation capability
#[async_trait]
pub trait ModelInvoker: Send + Sync + Debug {
    /// Generates a completion for `prompt` with the bound model
    async fn generate(&self, handle: &ModelHandle, prompt: &str) -> Result<String, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct MockModelInvoker {
        response: Option<String>,
        error: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockModelInvoker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(mut self, response: impl Into<String>) -> Self {
            self.response = Some(response.into());
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Prompts received so far
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelInvoker for MockModelInvoker {
        async fn generate(&self, handle: &ModelHandle, prompt: &str) -> Result<String, DomainError> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            if let Some(ref error) = self.error {
                return Err(DomainError::generation(handle.provider().as_str(), error.clone()));
            }

            self.response
                .clone()
                .ok_or_else(|| DomainError::generation("mock", "No mock response configured"))
        }
    }
}
