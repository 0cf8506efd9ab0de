//! Error types for census-wms crates.

use thiserror::Error;

/// Result type alias using WmsError.
pub type WmsResult<T> = Result<T, WmsError>;

/// Primary error type for WMS operations.
#[derive(Debug, Error)]
pub enum WmsError {
    // === WMS Protocol Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Style not found: {0}")]
    StyleNotFound(String),

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Invalid pixel coordinate: {0}")]
    InvalidPoint(String),

    #[error("Requested format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Layer is not queryable: {0}")]
    LayerNotQueryable(String),

    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    // === Data Errors ===
    #[error("Failed to read dataset: {0}")]
    DataReadError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl WmsError {
    pub fn invalid_parameter(param: &str, message: impl Into<String>) -> Self {
        WmsError::InvalidParameter {
            param: param.to_string(),
            message: message.into(),
        }
    }

    /// OGC WMS exception code for this error.
    pub fn wms_exception_code(&self) -> &'static str {
        match self {
            WmsError::MissingParameter(_) => "MissingParameterValue",
            WmsError::InvalidParameter { .. } => "InvalidParameterValue",
            WmsError::LayerNotFound(_) => "LayerNotDefined",
            WmsError::StyleNotFound(_) => "StyleNotDefined",
            WmsError::InvalidCrs(_) => "InvalidCRS",
            WmsError::InvalidBbox(_) => "InvalidBBox",
            WmsError::InvalidPoint(_) => "InvalidPoint",
            WmsError::UnsupportedFormat(_) => "InvalidFormat",
            WmsError::LayerNotQueryable(_) => "LayerNotQueryable",
            WmsError::OperationNotSupported(_) => "OperationNotSupported",
            _ => "NoApplicableCode",
        }
    }

    /// HTTP status for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WmsError::MissingParameter(_)
            | WmsError::InvalidParameter { .. }
            | WmsError::InvalidCrs(_)
            | WmsError::InvalidBbox(_)
            | WmsError::InvalidPoint(_)
            | WmsError::LayerNotQueryable(_)
            | WmsError::OperationNotSupported(_)
            | WmsError::UnsupportedFormat(_) => 400,

            WmsError::LayerNotFound(_) | WmsError::StyleNotFound(_) => 404,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for WmsError {
    fn from(err: std::io::Error) -> Self {
        WmsError::DataReadError(err.to_string())
    }
}

impl From<serde_json::Error> for WmsError {
    fn from(err: serde_json::Error) -> Self {
        WmsError::DataReadError(format!("JSON error: {}", err))
    }
}

impl From<crate::bbox::BboxParseError> for WmsError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        WmsError::InvalidBbox(err.to_string())
    }
}

impl From<crate::crs::CrsParseError> for WmsError {
    fn from(err: crate::crs::CrsParseError) -> Self {
        WmsError::InvalidCrs(err.to_string())
    }
}
