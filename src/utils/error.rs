use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
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

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Malformed sidecar '{file}': {reason}")]
    MalformedSidecar { file: String, reason: String },

    #[error("Project error: {message}")]
    ProjectError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Sidecar,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn project(message: impl Into<String>) -> Self {
        Self::ProjectError {
            message: message.into(),
        }
    }

    pub fn malformed_sidecar(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSidecar {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::MalformedSidecar { .. } => ErrorCategory::Sidecar,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ProjectError { .. } => ErrorCategory::Project,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // a broken sidecar only costs the markers of that one file
            ErrorCategory::Sidecar => ErrorSeverity::Low,
            ErrorCategory::Configuration | ErrorCategory::Project | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::IoError(_) => {
                "Check that the project and XML folders exist and are readable/writable".to_string()
            }
            EtlError::SerializationError(_) => {
                "The project file is not valid JSON; restore it from the backup copy".to_string()
            }
            EtlError::MalformedSidecar { .. } => {
                "Re-copy the XML sidecar from the camera card".to_string()
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run again".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration file", field)
            }
            EtlError::ProjectError { .. } => {
                "Make sure the editor is closed and the project folder is correct".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not access a file: {}", self),
            ErrorCategory::Data => format!("Could not read the project data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Sidecar => format!("Skipped a sidecar file: {}", self),
            ErrorCategory::Project => format!("Project problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
