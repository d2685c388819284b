//! Error types for `esri2sf` operations.
//!
//! Every failure of the pipeline lands in one of four categories: the request
//! could not be configured, the service answered with something unexpected,
//! the HTTP exchange failed, or a geometry could not be decoded. Writing a
//! finished table adds a fifth, [`OutputError`].

use std::path::PathBuf;

use esri_json::EsriJsonError;
use thiserror::Error;

/// Main error type for `esri2sf` operations.
///
/// Uses `#[error(transparent)]` to delegate display formatting to the
/// underlying category.
#[derive(Debug, Error)]
pub enum Esri2SfError {
    /// Invalid options or an unresolvable geometry type
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unparseable responses and service-reported errors
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// HTTP-level failures surfaced by the transport
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Geometry payloads that do not match their declared type
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Failures writing a converted table
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },

    /// Neither the caller nor the layer metadata named a decodable geometry type
    #[error("Cannot resolve geometry type for '{service}': {}", reported.as_deref().map_or_else(|| "layer reports no geometry type".to_string(), |name| format!("unsupported geometry type '{name}'")))]
    UnresolvedGeometryType {
        /// The service URL
        service: String,
        /// The `geometryType` the layer reported, if any
        reported: Option<String>,
    },
}

/// Protocol errors: the service answered, but not with what was expected.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Response body is not JSON or lacks expected members
    #[error("Invalid response{}: {message}", context.as_deref().map(|c| format!(" from {c}")).unwrap_or_default())]
    InvalidResponse {
        /// What was being requested
        context: Option<String>,
        /// Description of the problem
        message: String,
    },

    /// The service returned an ArcGIS error envelope
    #[error("Service error{}{}: {message}{}", code.map(|c| format!(" {c}")).unwrap_or_default(), context.as_deref().map(|c| format!(" from {c}")).unwrap_or_default(), if details.is_empty() { String::new() } else { format!(" ({})", details.join("; ")) })]
    Service {
        /// Error code reported by the service
        code: Option<i64>,
        /// Message reported by the service
        message: String,
        /// Detail lines reported by the service
        details: Vec<String>,
        /// What was being requested
        context: Option<String>,
    },
}

/// Transport errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or its body could not be read
    #[error("Request to '{url}' failed: {source}")]
    Request {
        /// The requested URL
        url: String,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with a non-success HTTP status
    #[error("Request to '{url}' returned HTTP {status}")]
    Status {
        /// The requested URL
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {message}")]
    Client {
        /// Description of the problem
        message: String,
    },
}

/// Geometry decoding errors.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// A geometry payload is missing parts required by its declared type
    #[error("Malformed {geometry_type} geometry{}: {message}", feature.map(|i| format!(" in feature {i}")).unwrap_or_default())]
    Malformed {
        /// The declared ArcGIS geometry type
        geometry_type: String,
        /// Description of the geometry problem
        message: String,
        /// Index of the feature in the fetched sequence
        feature: Option<usize>,
    },
}

/// Errors writing a converted table.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to create the output file
    #[error("Failed to create output file '{path}': {source}")]
    Create {
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode or write the table
    #[error("Failed to write {format} file '{path}': {source}")]
    Write {
        /// The output format
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Type alias for Results using `Esri2SfError`.
pub type Result<T> = std::result::Result<T, Esri2SfError>;

impl From<EsriJsonError> for Esri2SfError {
    fn from(err: EsriJsonError) -> Self {
        match err {
            EsriJsonError::Parse { message, context } => {
                ProtocolError::InvalidResponse { context, message }.into()
            },
            EsriJsonError::Service {
                code,
                message,
                details,
                context,
            } => ProtocolError::Service {
                code,
                message,
                details,
                context,
            }
            .into(),
            EsriJsonError::MalformedGeometry {
                geometry_type,
                message,
                feature,
            } => GeometryError::Malformed {
                geometry_type: geometry_type.esri_name().to_string(),
                message,
                feature,
            }
            .into(),
        }
    }
}

impl Esri2SfError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Protocol(e) => e.user_message(),
            Self::Transport(e) => format!("Network error: {e}"),
            Self::Geometry(e) => e.to_string(),
            Self::Output(e) => e.to_string(),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Config(ConfigError::UnresolvedGeometryType { .. }) => Some(
                "Pass the geometry type explicitly (point, multipoint, polyline or polygon)."
                    .to_string(),
            ),
            Self::Protocol(e) => e.recovery_suggestion(),
            Self::Transport(TransportError::Request { .. }) => Some(
                "Check the service URL and network access; use --insecure for self-signed certificates."
                    .to_string(),
            ),
            Self::Transport(TransportError::Status { status, .. }) if *status == 404 => {
                Some("Check that the service URL points to a layer, e.g. '.../FeatureServer/0'.".to_string())
            },
            _ => None,
        }
    }

    /// Check if this error is potentially recoverable by changing the request.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Protocol(ProtocolError::Service { .. })
        )
    }
}

impl ProtocolError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidResponse { .. } => {
                format!("The service returned an unexpected response. {self}")
            },
            Self::Service { code, message, .. } => match code {
                Some(code) => format!("The service rejected the request ({code}): {message}"),
                None => format!("The service rejected the request: {message}"),
            },
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Service {
                code: Some(498 | 499),
                ..
            } => Some("The token is missing, invalid or expired; generate a new one.".to_string()),
            Self::Service {
                code: Some(400), ..
            } => Some("Check the where clause and field names.".to_string()),
            Self::InvalidResponse { .. } => {
                Some("Make sure the URL points to an ArcGIS REST layer endpoint.".to_string())
            },
            Self::Service { .. } => None,
        }
    }
}
