//! Assembly of decoded features into a [`FeatureTable`].

use std::collections::HashSet;
use std::fmt;

use log::debug;
use serde_json::Value as JsonValue;

use crate::error::EsriJsonResult;
use crate::geometry::{GeometryType, SfGeometry, decode_geometry};
use crate::response::RawFeature;

/// Coordinate reference of every table produced by this crate. Features are
/// requested with `outSR=4326`, so coordinates arrive as WGS 84 lon/lat.
pub const WGS84_CRS: &str = "EPSG:4326";

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Convert back to JSON. Non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::Null => JsonValue::Null,
            AttributeValue::Bool(value) => JsonValue::Bool(*value),
            AttributeValue::Int(value) => JsonValue::from(*value),
            AttributeValue::Float(value) => serde_json::Number::from_f64(*value)
                .map_or(JsonValue::Null, JsonValue::Number),
            AttributeValue::String(value) => JsonValue::String(value.clone()),
        }
    }
}

impl From<&JsonValue> for AttributeValue {
    /// ArcGIS attributes are scalars; anything nested is kept as JSON text.
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => AttributeValue::Null,
            JsonValue::Bool(value) => AttributeValue::Bool(*value),
            JsonValue::Number(number) => number
                .as_i64()
                .map(AttributeValue::Int)
                .or_else(|| number.as_f64().map(AttributeValue::Float))
                .unwrap_or(AttributeValue::Null),
            JsonValue::String(value) => AttributeValue::String(value.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => AttributeValue::String(value.to_string()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("NULL"),
            AttributeValue::Bool(value) => write!(f, "{value}"),
            AttributeValue::Int(value) => write!(f, "{value}"),
            AttributeValue::Float(value) => write!(f, "{value}"),
            AttributeValue::String(value) => f.write_str(value),
        }
    }
}

/// One feature: its geometry and attribute values aligned with
/// [`FeatureTable::fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub geometry: SfGeometry,
    pub attributes: Vec<AttributeValue>,
}

/// Decoded features of one layer, in the order the service returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    geometry_type: GeometryType,
    fields: Vec<String>,
    rows: Vec<FeatureRow>,
    crs: &'static str,
}

impl FeatureTable {
    /// A table with no fields and no rows.
    #[must_use]
    pub fn empty(geometry_type: GeometryType) -> Self {
        Self {
            geometry_type,
            fields: Vec::new(),
            rows: Vec::new(),
            crs: WGS84_CRS,
        }
    }

    #[must_use]
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// Attribute names, in the order they were first seen.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    #[must_use]
    pub fn crs(&self) -> &str {
        self.crs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `field` in [`FeatureTable::fields`].
    #[must_use]
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|name| name == field)
    }

    /// Value of `field` in row `row`, or `None` when either does not exist.
    #[must_use]
    pub fn attribute(&self, row: usize, field: &str) -> Option<&AttributeValue> {
        let column = self.field_index(field)?;
        self.rows.get(row).map(|row| &row.attributes[column])
    }

    /// Iterate over the geometries of all rows.
    pub fn geometries(&self) -> impl Iterator<Item = &SfGeometry> {
        self.rows.iter().map(|row| &row.geometry)
    }
}

/// Decode `features` into a table.
///
/// Every input feature yields exactly one row, in input order. The field set
/// is the union of all attribute names; a feature lacking a field, or
/// carrying `null` for it, gets [`AttributeValue::Null`].
///
/// # Errors
///
/// Returns the first geometry decoding error, tagged with the index of the
/// offending feature.
pub fn build_feature_table(
    features: Vec<RawFeature>,
    geometry_type: GeometryType,
) -> EsriJsonResult<FeatureTable> {
    let fields = collect_fields(&features);

    let rows = features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = decode_geometry(feature.geometry.as_ref(), geometry_type)
                .map_err(|err| err.at_feature(index))?;
            let attributes = feature.attributes.unwrap_or_default();
            let attributes = fields
                .iter()
                .map(|field| {
                    attributes
                        .get(field)
                        .map_or(AttributeValue::Null, AttributeValue::from)
                })
                .collect();
            Ok(FeatureRow {
                geometry,
                attributes,
            })
        })
        .collect::<EsriJsonResult<Vec<_>>>()?;

    debug!(
        "Built {} {} rows with {} fields",
        rows.len(),
        geometry_type.simple_feature_name(),
        fields.len()
    );

    Ok(FeatureTable {
        geometry_type,
        fields,
        rows,
        crs: WGS84_CRS,
    })
}

fn collect_fields(features: &[RawFeature]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for attributes in features.iter().filter_map(|f| f.attributes.as_ref()) {
        for name in attributes.keys() {
            if seen.insert(name.as_str()) {
                fields.push(name.clone());
            }
        }
    }
    fields
}
