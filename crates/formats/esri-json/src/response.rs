//! ArcGIS REST response bodies and helpers to parse them.
//!
//! Every ArcGIS endpoint may answer with an error envelope
//! (`{"error": {"code": 400, "message": "...", "details": [...]}}`) and an
//! HTTP 200 status, so all parsers check for it before reading the payload.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{EsriJsonError, EsriJsonResult};
use crate::geometry::GeometryType;

/// JSON object type used for feature attributes.
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Layer metadata returned by `<service>?f=json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    /// Layer kind, e.g. `Feature Layer` or `Table`.
    #[serde(rename = "type")]
    pub layer_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Raw `geometryType` member, e.g. `esriGeometryPolygon`.
    #[serde(rename = "geometryType")]
    pub geometry_type_name: Option<String>,
    /// Page-size ceiling enforced by the server.
    pub max_record_count: Option<usize>,
    pub object_id_field: Option<String>,
    pub fields: Option<Vec<FieldDescriptor>>,
}

impl LayerInfo {
    /// The decodable geometry type of the layer, if it reports one.
    #[must_use]
    pub fn geometry_type(&self) -> Option<GeometryType> {
        self.geometry_type_name
            .as_deref()
            .and_then(GeometryType::from_esri_name)
    }

    /// Field descriptors, empty when the service omits them.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        self.fields.as_deref().unwrap_or_default()
    }
}

/// One entry of the `fields` list in layer metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// ESRI field type, e.g. `esriFieldTypeString`.
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub alias: Option<String>,
}

/// Body of a `returnIdsOnly=true` query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIdsResponse {
    pub object_id_field_name: Option<String>,
    /// `null` when no record matches.
    pub object_ids: Option<Vec<i64>>,
}

/// Body of a feature query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureQueryResponse {
    pub features: Vec<RawFeature>,
    /// Set when the server truncated the result at its page-size ceiling.
    #[serde(default)]
    pub exceeded_transfer_limit: bool,
}

/// One feature as returned by the service, before decoding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub attributes: Option<JsonObject>,
    #[serde(default)]
    pub geometry: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Vec<JsonValue>>,
}

/// Parse a layer metadata response.
///
/// # Errors
///
/// Returns [`EsriJsonError::Parse`] for bodies that are not JSON objects of the
/// expected shape and [`EsriJsonError::Service`] for ArcGIS error envelopes.
pub fn parse_layer_info(text: &str, context: &str) -> EsriJsonResult<LayerInfo> {
    parse_response(text, context)
}

/// Parse the response of an object-id query.
///
/// # Errors
///
/// See [`parse_layer_info`].
pub fn parse_object_ids(text: &str, context: &str) -> EsriJsonResult<ObjectIdsResponse> {
    parse_response(text, context)
}

/// Parse the response of a feature query.
///
/// # Errors
///
/// See [`parse_layer_info`]. A body without a `features` array is a parse
/// error.
pub fn parse_feature_response(text: &str, context: &str) -> EsriJsonResult<FeatureQueryResponse> {
    parse_response(text, context)
}

/// Parse any ArcGIS JSON response into `T`, surfacing error envelopes first.
///
/// # Errors
///
/// See [`parse_layer_info`].
pub fn parse_response<T: DeserializeOwned>(text: &str, context: &str) -> EsriJsonResult<T> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|err| EsriJsonError::parse(format!("response is not valid JSON: {err}"), context))?;

    if let Some(error) = value.get("error") {
        return Err(service_error(error, context));
    }

    serde_json::from_value(value)
        .map_err(|err| EsriJsonError::parse(format!("unexpected response shape: {err}"), context))
}

fn service_error(error: &JsonValue, context: &str) -> EsriJsonError {
    match ServiceErrorBody::deserialize(error) {
        Ok(body) => EsriJsonError::Service {
            code: body.code,
            message: body
                .message
                .unwrap_or_else(|| "service reported an error".to_string()),
            details: body
                .details
                .unwrap_or_default()
                .into_iter()
                .map(|detail| match detail {
                    JsonValue::String(text) => text,
                    other => other.to_string(),
                })
                .collect(),
            context: Some(context.to_string()),
        },
        Err(_) => EsriJsonError::Service {
            code: None,
            message: error.to_string(),
            details: Vec::new(),
            context: Some(context.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_layer_metadata() {
        let text = r#"{
            "currentVersion": 10.91,
            "id": 0,
            "name": "Parcels",
            "type": "Feature Layer",
            "geometryType": "esriGeometryPolygon",
            "objectIdField": "OBJECTID",
            "maxRecordCount": 2000,
            "fields": [
                {"name": "OBJECTID", "type": "esriFieldTypeOID", "alias": "OBJECTID"},
                {"name": "OWNER", "type": "esriFieldTypeString", "alias": "Owner", "length": 50}
            ]
        }"#;

        let info = parse_layer_info(text, "layer").expect("parse");
        assert_eq!(info.name.as_deref(), Some("Parcels"));
        assert_eq!(info.layer_type.as_deref(), Some("Feature Layer"));
        assert_eq!(info.geometry_type(), Some(GeometryType::Polygon));
        assert_eq!(info.max_record_count, Some(2000));
        assert_eq!(info.fields().len(), 2);
        assert_eq!(info.fields()[1].alias.as_deref(), Some("Owner"));
    }

    #[test]
    fn table_layer_has_no_geometry_type() {
        let info = parse_layer_info(r#"{"type": "Table", "fields": null}"#, "layer")
            .expect("parse");
        assert_eq!(info.geometry_type(), None);
        assert!(info.fields().is_empty());
    }

    #[test]
    fn parse_object_ids_list() {
        let response = parse_object_ids(
            r#"{"objectIdFieldName": "OBJECTID", "objectIds": [3, 1, 2]}"#,
            "ids",
        )
        .expect("parse");
        assert_eq!(response.object_ids, Some(vec![3, 1, 2]));
        assert_eq!(response.object_id_field_name.as_deref(), Some("OBJECTID"));
    }

    #[test]
    fn parse_null_object_ids() {
        let response = parse_object_ids(r#"{"objectIdFieldName": "FID", "objectIds": null}"#, "ids")
            .expect("parse");
        assert!(response.object_ids.is_none());
    }

    #[test]
    fn parse_features_with_null_geometry() {
        let text = r#"{
            "geometryType": "esriGeometryPoint",
            "spatialReference": {"wkid": 4326},
            "features": [
                {"attributes": {"id": 1}, "geometry": {"x": 1, "y": 2}},
                {"attributes": {"id": 2}, "geometry": null},
                {"attributes": null}
            ]
        }"#;

        let response = parse_feature_response(text, "batch").expect("parse");
        assert_eq!(response.features.len(), 3);
        assert!(response.features[1].geometry.is_none());
        assert!(response.features[2].attributes.is_none());
        assert!(!response.exceeded_transfer_limit);
    }

    #[test]
    fn missing_features_is_parse_error() {
        let err = parse_feature_response(r#"{"objectIds": [1]}"#, "batch 0").unwrap_err();
        match err {
            EsriJsonError::Parse { message, context } => {
                assert!(message.contains("unexpected response shape"));
                assert_eq!(context.as_deref(), Some("batch 0"));
            },
            _ => panic!("Expected Parse error"),
        }
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = parse_object_ids("<html>Bad gateway</html>", "ids").unwrap_err();
        assert!(err.to_string().contains("response is not valid JSON"));
    }

    #[test]
    fn error_envelope_is_service_error() {
        let text = r#"{"error": {"code": 498, "message": "Invalid Token", "details": ["Token expired"]}}"#;
        let err = parse_object_ids(text, "ids").unwrap_err();
        match err {
            EsriJsonError::Service {
                code,
                message,
                details,
                ..
            } => {
                assert_eq!(code, Some(498));
                assert_eq!(message, "Invalid Token");
                assert_eq!(details, vec!["Token expired".to_string()]);
            },
            _ => panic!("Expected Service error"),
        }
    }

    #[test]
    fn attribute_order_follows_the_server() {
        let response = parse_feature_response(
            r#"{"features": [{"attributes": {"zeta": 1, "alpha": 2, "mid": 3}}]}"#,
            "batch",
        )
        .expect("parse");
        let keys: Vec<&str> = response.features[0]
            .attributes
            .as_ref()
            .expect("attributes")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }
}
