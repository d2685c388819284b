//! Export of [`FeatureTable`]s to `GeoJSON`, Arrow record batches and CSV.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use arrow_array::builder::{BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{ArrowError, DataType, Field, Schema};
use geojson::{Feature, FeatureCollection, JsonObject};
use geozero::ToWkt;

use crate::geometry::SfGeometry;
use crate::table::{AttributeValue, FeatureTable};

/// Options controlling how tables are written.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Name of the geometry column in Arrow and CSV output.
    pub geometry_column_name: String,
    /// Pretty-print `GeoJSON` output.
    pub pretty: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            geometry_column_name: "geometry".to_string(),
            pretty: false,
        }
    }
}

/// Well-Known Text of a geometry. Empty geometries are written as
/// `<KIND> EMPTY`.
///
/// # Errors
///
/// Returns an error if the WKT encoder rejects the geometry.
pub fn geometry_to_wkt(geometry: &SfGeometry) -> Result<String, geozero::error::GeozeroError> {
    if geometry.is_empty() {
        return Ok(format!("{} EMPTY", geometry.kind()));
    }
    match geometry.to_geo() {
        Some(geo) => geo.to_wkt(),
        None => Ok(format!("{} EMPTY", geometry.kind())),
    }
}

/// Build a `GeoJSON` feature collection from a table. Empty points are
/// written with a `null` geometry.
#[must_use]
pub fn to_feature_collection(table: &FeatureTable) -> FeatureCollection {
    let features = table
        .rows()
        .iter()
        .map(|row| {
            let properties: JsonObject = table
                .fields()
                .iter()
                .zip(&row.attributes)
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect();
            Feature {
                bbox: None,
                geometry: row
                    .geometry
                    .to_geo()
                    .map(|geo| geojson::Geometry::new(geojson::Value::from(&geo))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Write a table as a `GeoJSON` feature collection.
///
/// # Errors
///
/// Returns an error if serialization or the underlying writer fails.
pub fn write_geojson<W: Write>(
    writer: &mut W,
    table: &FeatureTable,
    options: &WriterOptions,
) -> Result<(), serde_json::Error> {
    let collection = to_feature_collection(table);
    if options.pretty {
        serde_json::to_writer_pretty(writer, &collection)
    } else {
        serde_json::to_writer(writer, &collection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Null,
    Bool,
    Int,
    Float,
    Utf8,
}

impl ColumnKind {
    fn of(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Null => ColumnKind::Null,
            AttributeValue::Bool(_) => ColumnKind::Bool,
            AttributeValue::Int(_) => ColumnKind::Int,
            AttributeValue::Float(_) => ColumnKind::Float,
            AttributeValue::String(_) => ColumnKind::Utf8,
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnKind::Null, other) | (other, ColumnKind::Null) => other,
            (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
                ColumnKind::Float
            },
            _ => ColumnKind::Utf8,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Int => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Null | ColumnKind::Utf8 => DataType::Utf8,
        }
    }
}

/// Convert a table into an Arrow [`RecordBatch`].
///
/// Attribute columns are typed from their values (integers widen to floats,
/// any other mix falls back to strings). The geometry is stored as WKT in a
/// trailing column whose field metadata carries the CRS.
///
/// # Errors
///
/// Returns an error if a geometry cannot be encoded or the batch is invalid.
pub fn to_record_batch(
    table: &FeatureTable,
    options: &WriterOptions,
) -> Result<RecordBatch, ArrowError> {
    let mut fields = Vec::with_capacity(table.fields().len() + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.fields().len() + 1);

    for (index, name) in table.fields().iter().enumerate() {
        let kind = table
            .rows()
            .iter()
            .map(|row| ColumnKind::of(&row.attributes[index]))
            .fold(ColumnKind::Null, ColumnKind::merge);
        fields.push(Field::new(name, kind.data_type(), true));
        columns.push(build_column(table, index, kind));
    }

    let geometry_name = unique_column_name(table.fields(), &options.geometry_column_name);
    let mut wkt = StringBuilder::new();
    for row in table.rows() {
        let text = geometry_to_wkt(&row.geometry)
            .map_err(|err| ArrowError::ExternalError(Box::new(err)))?;
        wkt.append_value(text);
    }
    let metadata = HashMap::from([
        ("crs".to_string(), table.crs().to_string()),
        ("encoding".to_string(), "WKT".to_string()),
        (
            "geometry_type".to_string(),
            table.geometry_type().simple_feature_name().to_string(),
        ),
    ]);
    fields.push(Field::new(geometry_name, DataType::Utf8, false).with_metadata(metadata));
    columns.push(Arc::new(wkt.finish()));

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, columns)
}

fn build_column(table: &FeatureTable, index: usize, kind: ColumnKind) -> ArrayRef {
    let values = table.rows().iter().map(|row| &row.attributes[index]);
    match kind {
        ColumnKind::Bool => {
            let mut builder = BooleanBuilder::new();
            for value in values {
                match value {
                    AttributeValue::Bool(v) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        },
        ColumnKind::Int => {
            let mut builder = Int64Builder::new();
            for value in values {
                match value {
                    AttributeValue::Int(v) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        },
        ColumnKind::Float => {
            let mut builder = Float64Builder::new();
            for value in values {
                match value {
                    #[allow(clippy::cast_precision_loss)]
                    AttributeValue::Int(v) => builder.append_value(*v as f64),
                    AttributeValue::Float(v) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        },
        ColumnKind::Null | ColumnKind::Utf8 => {
            let mut builder = StringBuilder::new();
            for value in values {
                if value.is_null() {
                    builder.append_null();
                } else {
                    builder.append_value(value.to_string());
                }
            }
            Arc::new(builder.finish())
        },
    }
}

fn unique_column_name(existing: &[String], preferred: &str) -> String {
    let mut candidate = preferred.to_string();
    let mut suffix = 1;
    while existing.iter().any(|name| name == &candidate) {
        candidate = format!("{preferred}_{suffix}");
        suffix += 1;
    }
    candidate
}

/// Write a table as CSV with a header row and a WKT geometry column.
///
/// # Errors
///
/// Returns an error if the batch cannot be built or written.
pub fn write_csv<W: Write>(
    writer: W,
    table: &FeatureTable,
    options: &WriterOptions,
) -> Result<(), ArrowError> {
    let batch = to_record_batch(table, options)?;
    let mut csv_writer = arrow_csv::WriterBuilder::new()
        .with_header(true)
        .build(writer);
    csv_writer.write(&batch)
}
