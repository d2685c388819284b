//! Data types describing ArcGIS layers.
//!
//! These are the display-oriented views returned by
//! [`describe_layer`](crate::operations::describe_layer).

use esri_json::GeometryType;

/// Information about a layer.
#[derive(Debug, Clone)]
pub struct LayerSummary {
    /// Normalised layer URL
    pub url: String,
    /// Layer name
    pub name: Option<String>,
    /// Layer kind (e.g. "Feature Layer", "Table")
    pub layer_type: Option<String>,
    /// Decodable geometry type, if any
    pub geometry_type: Option<GeometryType>,
    /// Geometry type exactly as reported by the service
    pub reported_geometry_type: Option<String>,
    /// Records returned per query at most
    pub max_record_count: Option<usize>,
    /// Name of the object id field
    pub object_id_field: Option<String>,
    /// Attribute fields
    pub fields: Vec<FieldSummary>,
}

impl LayerSummary {
    /// Whether [`convert`](crate::operations::convert) can read this layer
    /// without an explicit geometry type.
    #[must_use]
    pub fn is_convertible(&self) -> bool {
        self.geometry_type.is_some()
    }
}

/// Information about an attribute field.
#[derive(Debug, Clone)]
pub struct FieldSummary {
    /// Field name
    pub name: String,
    /// Human-readable field type
    pub field_type: String,
    /// Alias, when it differs from the name
    pub alias: Option<String>,
}
