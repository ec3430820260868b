/// Main library error type
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

impl DashboardError {
    /// Short variant name, used as the `type` of API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::DataUnavailable(_) => "DataUnavailable",
            DashboardError::ConfigurationError(_) => "ConfigurationError",
            DashboardError::InvalidField(_) => "InvalidField",
            DashboardError::InvalidRequest(_) => "InvalidRequest",
            DashboardError::RenderError(_) => "RenderError",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
