use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Endpoint resolution failed for {url}: {reason}")]
    ResolutionError { url: String, reason: String },

    #[error("Offer fetch failed for {url}: {reason}")]
    FetchError { url: String, reason: String },

    #[error("Unexpected error: {message}")]
    UnexpectedError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CompareError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CompareError::ValidationError { .. } => ErrorCategory::Input,
            CompareError::ConfigError { .. }
            | CompareError::ConfigValidationError { .. }
            | CompareError::InvalidConfigValueError { .. }
            | CompareError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CompareError::ApiError(_)
            | CompareError::ResolutionError { .. }
            | CompareError::FetchError { .. } => ErrorCategory::Network,
            CompareError::CsvError(_)
            | CompareError::SerializationError(_)
            | CompareError::ZipError(_) => ErrorCategory::Data,
            CompareError::IoError(_) | CompareError::UnexpectedError { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            // 單一 CID 的網路錯誤會在重試層被吸收
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 對使用者顯示的訊息，不洩漏內部錯誤內容
    pub fn user_friendly_message(&self) -> String {
        match self {
            CompareError::ValidationError { message } => message.clone(),
            CompareError::ConfigError { .. }
            | CompareError::ConfigValidationError { .. }
            | CompareError::InvalidConfigValueError { .. }
            | CompareError::MissingConfigError { .. } => format!("Configuration problem: {}", self),
            CompareError::ResolutionError { .. }
            | CompareError::FetchError { .. }
            | CompareError::ApiError(_) => "Could not reach the booking site".to_string(),
            CompareError::IoError(_) | CompareError::ZipError(_) | CompareError::CsvError(_) => {
                "Could not write the export file".to_string()
            }
            CompareError::SerializationError(_) | CompareError::UnexpectedError { .. } => {
                "Price collection failed".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CompareError::ValidationError { .. } => {
                "Paste the full hotel detail page URL, including its cid parameter"
            }
            CompareError::ConfigError { .. }
            | CompareError::ConfigValidationError { .. }
            | CompareError::InvalidConfigValueError { .. }
            | CompareError::MissingConfigError { .. } => {
                "Check the configuration file and command line flags"
            }
            CompareError::ApiError(_)
            | CompareError::ResolutionError { .. }
            | CompareError::FetchError { .. } => {
                "Check network connectivity or retry with --sequential"
            }
            CompareError::IoError(_) | CompareError::ZipError(_) | CompareError::CsvError(_) => {
                "Check that the export directory exists and is writable"
            }
            CompareError::SerializationError(_) | CompareError::UnexpectedError { .. } => {
                "Retry the comparison; run with --verbose for details"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;
