use crate::protocol::codec::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not read config file {path}: {message}")]
    ConfigFile { path: String, message: String },

    #[error("Invalid command payload: {0}")]
    Decode(#[from] DecodeError),

    #[error("Output driver error: {0}")]
    Driver(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::ConfigFile { .. } => 2,
            AppError::Decode(_) => 3,
            AppError::Driver(_) => 4,
            AppError::Json(_) => 1,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::ConfigFile { .. } => "config_file",
            AppError::Decode(_) => "decode",
            AppError::Driver(_) => "driver",
            AppError::Json(_) => "json",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error_type(),
            "message": self.to_string(),
        })
    }
}
