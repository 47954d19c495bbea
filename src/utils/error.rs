use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Settings file error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{service} service returned {status}: {message}")]
    UpstreamError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Could not extract {what} from model output: {message}")]
    ExtractionError { what: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

impl LensError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn upstream(service: &str, status: u16, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            service: service.to_string(),
            status,
            message: message.into(),
        }
    }

    pub fn extraction(what: &str, message: impl Into<String>) -> Self {
        Self::ExtractionError {
            what: what.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status used when the error reaches an API caller.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => 400,
            Self::ExtractionError { .. } => 422,
            Self::UpstreamError { .. } | Self::HttpError(_) => 502,
            _ => 500,
        }
    }

    /// CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => 2,
            Self::UpstreamError { .. } | Self::HttpError(_) => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LensError::validation("bad").status_code(), 400);
        assert_eq!(LensError::upstream("query", 500, "boom").status_code(), 502);
        assert_eq!(LensError::extraction("json", "none").status_code(), 422);
        assert_eq!(LensError::processing("x").status_code(), 500);
    }

    #[test]
    fn test_upstream_message_keeps_body() {
        let err = LensError::upstream("openai", 429, "Rate limit reached");
        assert_eq!(err.to_string(), "openai service returned 429: Rate limit reached");
        assert_eq!(err.exit_code(), 3);
    }
}
