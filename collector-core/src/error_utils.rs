use crate::error::*;
use tracing::{error, info};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Authentication(e) | CoreError::Fetch(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            CoreError::Storage(e) => {
                error!("Storage error details: {:?}", e);
            }
        }
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Authentication(e) | CoreError::Fetch(e) => e.user_friendly_message(),
            CoreError::Storage(e) => e.user_friendly_message(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Authentication(_) => "AUTHENTICATION".to_string(),
            CoreError::Fetch(_) => "FETCH".to_string(),
            CoreError::Storage(_) => "STORAGE".to_string(),
        }
    }
}

impl CoreError {
    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CoreError::Config(_) => 2,
            CoreError::Authentication(_) => 3,
            CoreError::Fetch(_) => 4,
            CoreError::Storage(_) => 5,
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. You may not have permission to view this content.",
                resource
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out. Please try again.".to_string()
            }
            RedditApiError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
            RedditApiError::Network(_) => "REDDIT_NETWORK".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::MissingEnvironmentVariables { names } => format!(
                "Environment variables {} are required but not set. Add them to your environment or a .env file.",
                names.join(", ")
            ),
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::MissingEnvironmentVariables { .. } => {
                "CONFIG_MISSING_ENV_VAR".to_string()
            }
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
        }
    }
}

impl ErrorExt for StorageError {
    fn log_error(&self) -> &Self {
        error!("StorageError: {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StorageError::Io { path, .. } => format!(
                "Could not write {}. Check that the directory exists and is writable.",
                path.display()
            ),
            StorageError::Serialization { .. } => {
                "Collected posts could not be serialized.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            StorageError::Io { .. } => "STORAGE_IO".to_string(),
            StorageError::Serialization { .. } => "STORAGE_SERIALIZATION".to_string(),
        }
    }
}

/// Final report for an error that ends the run.
pub fn report_critical(error: &CoreError) {
    error!("A critical error occurred: {}", error);
    info!("Error code: {}", error.error_code());
    info!("User message: {}", error.user_friendly_message());
}
