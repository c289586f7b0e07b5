use crate::utils::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedistributionError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Redistribution rules are invalid ({} problem(s))", .errors.len())]
    RuleValidationError { errors: Vec<ValidationError> },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Io,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RedistributionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RedistributionError::ConfigError { .. }
            | RedistributionError::MissingConfigError { .. }
            | RedistributionError::InvalidConfigValueError { .. }
            | RedistributionError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            RedistributionError::RuleValidationError { .. } => ErrorCategory::Validation,
            RedistributionError::IoError(_) | RedistributionError::CsvError(_) => {
                ErrorCategory::Io
            }
            RedistributionError::SerializationError(_)
            | RedistributionError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// CLI 結束碼：設定錯誤 1、規則錯誤 2、IO 錯誤 3
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Processing => 1,
            ErrorCategory::Validation => 2,
            ErrorCategory::Io => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the scenario TOML file: required sections, field names and value ranges"
            }
            ErrorCategory::Validation => {
                "Fix the listed deduction/target rows and run the redistribution again"
            }
            ErrorCategory::Io => "Make sure the input file exists and the output path is writable",
            ErrorCategory::Processing => "Inspect the input data; run with --verbose for details",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RedistributionError::RuleValidationError { errors } => {
                let mut message = String::from("Redistribution rules are invalid:");
                for error in errors {
                    message.push_str(&format!("\n  - {}: {}", error.field, error.message));
                }
                message
            }
            RedistributionError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RedistributionError>;
