//! Conversion of a whole layer into a feature table.
//!
//! [`convert`] runs the pipeline end to end: resolve the geometry type, list
//! the matching object ids, fetch their features in batches and decode them
//! into a [`FeatureTable`]. [`describe_layer`] reads the layer metadata only.

use esri_json::{FeatureTable, GeometryType, LayerInfo, build_feature_table};
use log::{debug, info, warn};

use crate::config::{ConvertOptions, MAX_BATCH_SIZE};
use crate::error::{ConfigError, Result};
use crate::query::{BatchRequest, ObjectIdSet, fetch_features, fetch_object_ids};
use crate::service::{ServiceUrl, fetch_layer_info, layer_geometry_type};
use crate::transport::Transport;
use crate::types::{FieldSummary, LayerSummary};
use crate::utils::EsriFieldTypeExt;

/// Converts the records of an ArcGIS layer into a simple-feature table.
///
/// The geometry type given in `options` is used as is; without one the layer
/// metadata is fetched and its `geometryType` used. Metadata reporting a
/// `maxRecordCount` below the configured batch size lowers the batch size.
///
/// No matching record is not an error: a warning is logged and an empty
/// table returned.
///
/// # Arguments
///
/// * `transport` - Sends the HTTP requests.
/// * `service_url` - URL of the layer, e.g. `.../FeatureServer/0`.
/// * `options` - Fields, filter, token and batching settings.
///
/// # Errors
///
/// This function will return an error if:
/// - `options` or `service_url` are invalid, or no geometry type can be
///   resolved ([`ConfigError`]).
/// - Any request fails ([`TransportError`](crate::error::TransportError)).
/// - Any response is not what the protocol expects or is an ArcGIS error
///   ([`ProtocolError`](crate::error::ProtocolError)).
/// - Any geometry cannot be decoded
///   ([`GeometryError`](crate::error::GeometryError)).
pub async fn convert<T: Transport + ?Sized>(
    transport: &T,
    service_url: &str,
    options: &ConvertOptions,
) -> Result<FeatureTable> {
    options.validate()?;
    let service = ServiceUrl::parse(service_url)?;
    info!("Converting {service}");

    let mut batch_size = options.batch_size;
    let geometry_type = match options.geometry_type {
        Some(geometry_type) => geometry_type,
        None => {
            let layer = fetch_layer_info(transport, &service, &options.token).await?;
            batch_size = limit_batch_size(batch_size, &layer);
            layer_geometry_type(&layer, &service)?
        },
    };
    debug!("Geometry type {geometry_type}, batch size {batch_size}");

    let ids = match fetch_object_ids(transport, &service, &options.where_clause, &options.token)
        .await?
    {
        ObjectIdSet::Empty => {
            warn!(
                "No records match '{}' in {service}",
                options.where_clause
            );
            return Ok(FeatureTable::empty(geometry_type));
        },
        ObjectIdSet::Ids(ids) => ids,
    };

    let request = BatchRequest {
        out_fields: options.out_fields_param(),
        token: options.token.clone(),
        batch_size,
        concurrency: options.concurrency,
    };
    let features = fetch_features(transport, &service, &ids, &request).await?;
    let table = build_feature_table(features, geometry_type)?;

    info!(
        "Converted {} feature(s) with {} field(s)",
        table.len(),
        table.fields().len()
    );
    Ok(table)
}

fn limit_batch_size(batch_size: usize, layer: &LayerInfo) -> usize {
    match layer.max_record_count {
        Some(max) if max > 0 && max < batch_size => {
            info!("Layer returns at most {max} records per query; using batch size {max}");
            max
        },
        _ => batch_size.min(MAX_BATCH_SIZE),
    }
}

/// Reads the metadata of a layer into a [`LayerSummary`].
///
/// # Errors
///
/// Returns a configuration error for an invalid URL, a transport error if
/// the request fails and a protocol error if the body is not layer metadata.
pub async fn describe_layer<T: Transport + ?Sized>(
    transport: &T,
    service_url: &str,
    token: &str,
) -> Result<LayerSummary> {
    let service = ServiceUrl::parse(service_url)?;
    let layer = fetch_layer_info(transport, &service, token).await?;

    let fields = layer
        .fields()
        .iter()
        .map(|field| FieldSummary {
            name: field.name.clone(),
            field_type: field
                .field_type
                .as_deref()
                .map_or_else(|| "Unknown".to_string(), |t| t.format_field_type()),
            alias: field.alias.clone().filter(|alias| alias != &field.name),
        })
        .collect();

    Ok(LayerSummary {
        url: service.to_string(),
        name: layer.name.clone(),
        layer_type: layer.layer_type.clone(),
        geometry_type: layer.geometry_type(),
        reported_geometry_type: layer.geometry_type_name.clone(),
        max_record_count: layer.max_record_count,
        object_id_field: layer.object_id_field.clone(),
        fields,
    })
}

/// Resolves a geometry type name given on the command line or in a config.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOption`] for names that are not a known geometry type.
pub fn parse_geometry_type(name: &str) -> std::result::Result<GeometryType, ConfigError> {
    name.parse::<GeometryType>()
        .map_err(|message| ConfigError::InvalidOption {
            option: "geometry type".to_string(),
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_follows_max_record_count() {
        let layer = LayerInfo {
            max_record_count: Some(200),
            ..LayerInfo::default()
        };
        assert_eq!(limit_batch_size(500, &layer), 200);
        assert_eq!(limit_batch_size(100, &layer), 100);

        let layer = LayerInfo {
            max_record_count: Some(2000),
            ..LayerInfo::default()
        };
        assert_eq!(limit_batch_size(500, &layer), 500);

        let layer = LayerInfo {
            max_record_count: Some(0),
            ..LayerInfo::default()
        };
        assert_eq!(limit_batch_size(500, &layer), 500);
        assert_eq!(limit_batch_size(500, &LayerInfo::default()), 500);
    }

    #[test]
    fn geometry_type_names() {
        assert_eq!(parse_geometry_type("polygon").expect("type"), GeometryType::Polygon);
        assert_eq!(
            parse_geometry_type("esriGeometryPoint").expect("type"),
            GeometryType::Point
        );
        let err = parse_geometry_type("envelope").unwrap_err();
        assert!(err.to_string().starts_with("Invalid geometry type option"));
    }
}
