use std::error::Error as StdError;
use std::fmt;

use crate::geometry::GeometryType;

/// Errors raised while reading ESRI-JSON responses and geometries.
#[derive(Debug)]
pub enum EsriJsonError {
    /// The response body is not JSON, or lacks members the reader expects.
    Parse {
        /// Human readable description of the failure.
        message: String,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// The service answered with an ArcGIS error envelope instead of data.
    Service {
        /// Error code reported by the service (often an HTTP-like status).
        code: Option<i64>,
        /// Message reported by the service.
        message: String,
        /// Additional detail lines reported by the service.
        details: Vec<String>,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// A geometry payload is missing the parts its declared type requires.
    MalformedGeometry {
        /// The geometry type the payload was decoded as.
        geometry_type: GeometryType,
        /// Human readable description of the failure.
        message: String,
        /// Zero-based index of the feature within the decoded sequence.
        feature: Option<usize>,
    },
}

impl EsriJsonError {
    fn fmt_context(context: Option<&str>) -> String {
        context
            .map(|c| format!(" while reading {c}"))
            .unwrap_or_default()
    }

    pub(crate) fn parse(message: impl Into<String>, context: &str) -> Self {
        EsriJsonError::Parse {
            message: message.into(),
            context: Some(context.to_string()),
        }
    }

    pub(crate) fn malformed(geometry_type: GeometryType, message: impl Into<String>) -> Self {
        EsriJsonError::MalformedGeometry {
            geometry_type,
            message: message.into(),
            feature: None,
        }
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            EsriJsonError::Parse {
                context: existing, ..
            }
            | EsriJsonError::Service {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            EsriJsonError::MalformedGeometry { message, .. } => {
                message.push_str(" (");
                message.push_str(&context);
                message.push(')');
            },
        }
        self
    }

    /// Record which feature of a sequence failed to decode.
    #[must_use]
    pub fn at_feature(mut self, index: usize) -> Self {
        if let EsriJsonError::MalformedGeometry { feature, .. } = &mut self {
            *feature = Some(index);
        }
        self
    }
}

impl fmt::Display for EsriJsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsriJsonError::Parse { message, context } => write!(
                f,
                "Parse error{}: {message}",
                Self::fmt_context(context.as_deref())
            ),
            EsriJsonError::Service {
                code,
                message,
                details,
                context,
            } => {
                write!(f, "Service error")?;
                if let Some(code) = code {
                    write!(f, " {code}")?;
                }
                write!(f, "{}: {message}", Self::fmt_context(context.as_deref()))?;
                if !details.is_empty() {
                    write!(f, " ({})", details.join("; "))?;
                }
                Ok(())
            },
            EsriJsonError::MalformedGeometry {
                geometry_type,
                message,
                feature,
            } => {
                write!(f, "Malformed {} geometry", geometry_type.esri_name())?;
                if let Some(index) = feature {
                    write!(f, " in feature {index}")?;
                }
                write!(f, ": {message}")
            },
        }
    }
}

impl StdError for EsriJsonError {}

/// Result type alias that uses [`EsriJsonError`].
pub type EsriJsonResult<T> = Result<T, EsriJsonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error_with_context() {
        let error = EsriJsonError::Parse {
            message: "missing field `features`".to_string(),
            context: Some("https://example.com/FeatureServer/0/query".to_string()),
        };

        assert_eq!(
            error.to_string(),
            "Parse error while reading https://example.com/FeatureServer/0/query: missing field `features`"
        );
    }

    #[test]
    fn display_service_error_with_details() {
        let error = EsriJsonError::Service {
            code: Some(400),
            message: "Unable to complete operation.".to_string(),
            details: vec!["Invalid query parameters.".to_string()],
            context: None,
        };

        assert_eq!(
            error.to_string(),
            "Service error 400: Unable to complete operation. (Invalid query parameters.)"
        );
    }

    #[test]
    fn malformed_geometry_records_feature_index() {
        let error = EsriJsonError::malformed(GeometryType::Polyline, "path 0 is not an array")
            .at_feature(7);

        assert_eq!(
            error.to_string(),
            "Malformed esriGeometryPolyline geometry in feature 7: path 0 is not an array"
        );
    }

    #[test]
    fn additional_context_is_appended() {
        let error = EsriJsonError::parse("bad", "object ids").with_additional_context("batch 2");
        match error {
            EsriJsonError::Parse { context, .. } => {
                assert_eq!(context.as_deref(), Some("object ids; batch 2"));
            },
            _ => panic!("Expected Parse error"),
        }
    }
}
