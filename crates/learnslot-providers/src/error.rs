//! Error types for calendar provider operations.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The user has not granted access to the calendar.
    AccessDenied,
    /// The backend failed for another reason (unreadable store, bad data).
    ProviderError,
    /// An event could not be created.
    CreateFailed,
    /// An event could not be updated.
    UpdateFailed,
    /// An event could not be deleted.
    DeleteFailed,
    /// The target event does not exist.
    NotFound,
}

impl ProviderErrorCode {
    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::ProviderError => "provider_error",
            Self::CreateFailed => "create_failed",
            Self::UpdateFailed => "update_failed",
            Self::DeleteFailed => "delete_failed",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a calendar provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Creates an access denied error.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AccessDenied, message)
    }

    /// Creates a generic backend error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ProviderError, message)
    }

    /// Creates a create failure.
    pub fn create_failed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CreateFailed, message)
    }

    /// Creates an update failure.
    pub fn update_failed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::UpdateFailed, message)
    }

    /// Creates a delete failure.
    pub fn delete_failed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::DeleteFailed, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Copies code, message and provider name, dropping the source.
    pub fn detached(&self) -> Self {
        Self {
            code: self.code,
            message: self.message.clone(),
            provider: self.provider.clone(),
            source: None,
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
