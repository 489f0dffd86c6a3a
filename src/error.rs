//! Error types and handling for the `WeatherTable` service

use thiserror::Error;

/// Failure to obtain weather facts for a single location.
///
/// Never escapes the dataset builder: every variant is absorbed into a
/// fully unavailable record.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}")]
    Status { status: u16 },

    /// Provider answered, but an expected field was missing or unparsable
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Missing or malformed field, named for the log line
    pub fn missing_field(field: &str) -> Self {
        Self::Parse(format!("missing or unparsable field '{field}'"))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
            },
            None => FetchError::Network(err.to_string()),
        }
    }
}

/// Failure while drawing or encoding the table image. Fatal to the request.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid canvas: {0}")]
    Canvas(String),

    #[error("Encoding error: {0}")]
    Encode(String),
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Encode(err.to_string())
    }
}

/// Main error type for the `WeatherTable` service
#[derive(Error, Debug)]
pub enum WeatherTableError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Image rendering errors
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl WeatherTableError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherTableError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            WeatherTableError::Render(_) => "Erro ao gerar imagem".to_string(),
        }
    }
}
