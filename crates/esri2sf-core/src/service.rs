//! Layer endpoints and their metadata.

use std::fmt;

use esri_json::{GeometryType, LayerInfo, parse_layer_info};
use log::{debug, info};
use url::Url;

use crate::error::{ConfigError, Result};
use crate::transport::{Transport, form_fields};

/// URL of one ArcGIS layer, e.g. `https://host/arcgis/rest/services/Parcels/FeatureServer/0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrl {
    base: String,
}

impl ServiceUrl {
    /// Parse and normalise a layer URL. Query string, fragment and trailing
    /// slashes are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for URLs that do not parse or
    /// are not `http`/`https`.
    pub fn parse(input: &str) -> std::result::Result<Self, ConfigError> {
        let mut url = Url::parse(input.trim()).map_err(|err| ConfigError::InvalidOption {
            option: "service url".to_string(),
            message: format!("'{input}' is not a valid URL: {err}"),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidOption {
                option: "service url".to_string(),
                message: format!("unsupported scheme '{}', expected http or https", url.scheme()),
            });
        }

        url.set_query(None);
        url.set_fragment(None);
        let base = url.as_str().trim_end_matches('/').to_string();
        Ok(Self { base })
    }

    /// The layer URL itself, which serves metadata.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// The layer's `query` operation.
    #[must_use]
    pub fn query_url(&self) -> String {
        format!("{}/query", self.base)
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// Fetch layer metadata (`<service>?f=json`).
///
/// # Errors
///
/// Returns a transport error if the request fails and a protocol error if
/// the body is not layer metadata.
pub async fn fetch_layer_info<T: Transport + ?Sized>(
    transport: &T,
    service: &ServiceUrl,
    token: &str,
) -> Result<LayerInfo> {
    debug!("Fetching layer metadata from {service}");
    let form = form_fields(&[("f", "json"), ("token", token)]);
    let body = transport.post(service.as_str(), &form).await?;
    let info = parse_layer_info(&body, service.as_str())?;
    info!(
        "Layer '{}' ({}), geometry type {}",
        info.name.as_deref().unwrap_or("unnamed"),
        info.layer_type.as_deref().unwrap_or("unknown type"),
        info.geometry_type_name.as_deref().unwrap_or("none")
    );
    Ok(info)
}

/// Geometry type of `info`, or a configuration error naming what the layer
/// reported instead.
///
/// # Errors
///
/// Returns [`ConfigError::UnresolvedGeometryType`] when the layer reports no
/// geometry type or one that cannot be decoded.
pub fn layer_geometry_type(
    info: &LayerInfo,
    service: &ServiceUrl,
) -> std::result::Result<GeometryType, ConfigError> {
    info.geometry_type()
        .ok_or_else(|| ConfigError::UnresolvedGeometryType {
            service: service.to_string(),
            reported: info.geometry_type_name.clone(),
        })
}
