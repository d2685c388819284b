//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting layer metadata in a human-readable format.

use tabled::{Table, Tabled};

use esri2sf_core::LayerSummary;

/// Table row representation for displaying layer properties.
#[derive(Tabled)]
pub struct PropertyRow {
    #[tabled(rename = "Property")]
    pub property: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Table row representation for displaying field information.
#[derive(Tabled)]
pub struct FieldRow {
    /// Name of the field.
    #[tabled(rename = "Field")]
    pub name: String,
    /// Human-readable field type.
    #[tabled(rename = "Type")]
    pub field_type: String,
    /// Field alias, or empty when it equals the name.
    #[tabled(rename = "Alias")]
    pub alias: String,
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or("N/A").to_string()
}

/// Rows describing the layer itself.
pub fn property_rows(summary: &LayerSummary) -> Vec<PropertyRow> {
    let geometry = match (&summary.geometry_type, &summary.reported_geometry_type) {
        (Some(geometry_type), _) => format!(
            "{} ({})",
            geometry_type.esri_name(),
            geometry_type.simple_feature_name()
        ),
        (None, Some(reported)) => format!("{reported} (unsupported)"),
        (None, None) => "None".to_string(),
    };

    vec![
        PropertyRow {
            property: "Name".to_string(),
            value: or_na(summary.name.as_deref()),
        },
        PropertyRow {
            property: "Type".to_string(),
            value: or_na(summary.layer_type.as_deref()),
        },
        PropertyRow {
            property: "Geometry".to_string(),
            value: geometry,
        },
        PropertyRow {
            property: "Max Record Count".to_string(),
            value: summary
                .max_record_count
                .map_or_else(|| "N/A".to_string(), |count| count.to_string()),
        },
        PropertyRow {
            property: "Object Id Field".to_string(),
            value: or_na(summary.object_id_field.as_deref()),
        },
    ]
}

/// Display layer metadata in formatted tables on standard output.
pub fn display_layer_summary(summary: &LayerSummary) {
    println!("\nLayer: {}", summary.url);
    println!("{}", Table::new(property_rows(summary)));

    if !summary.fields.is_empty() {
        println!("\n=== Fields ===");

        let field_rows: Vec<FieldRow> = summary
            .fields
            .iter()
            .map(|f| FieldRow {
                name: f.name.clone(),
                field_type: f.field_type.clone(),
                alias: f.alias.clone().unwrap_or_default(),
            })
            .collect();

        let field_table = Table::new(field_rows).to_string();
        println!("{field_table}");
    }

    if !summary.is_convertible() {
        println!("\nThis layer has no supported geometry and cannot be converted.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esri2sf_core::{FieldSummary, GeometryType};

    fn summary() -> LayerSummary {
        LayerSummary {
            url: "https://example.com/FeatureServer/0".to_string(),
            name: Some("Parcels".to_string()),
            layer_type: Some("Feature Layer".to_string()),
            geometry_type: Some(GeometryType::Polygon),
            reported_geometry_type: Some("esriGeometryPolygon".to_string()),
            max_record_count: Some(2000),
            object_id_field: None,
            fields: vec![FieldSummary {
                name: "OBJECTID".to_string(),
                field_type: "ObjectId".to_string(),
                alias: None,
            }],
        }
    }

    #[test]
    fn test_property_rows() {
        let rows = property_rows(&summary());
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].value, "Parcels");
        assert_eq!(rows[2].value, "esriGeometryPolygon (MULTIPOLYGON)");
        assert_eq!(rows[3].value, "2000");
        assert_eq!(rows[4].value, "N/A");
    }

    #[test]
    fn test_unsupported_geometry_row() {
        let mut summary = summary();
        summary.geometry_type = None;
        summary.reported_geometry_type = Some("esriGeometryEnvelope".to_string());
        let rows = property_rows(&summary);
        assert_eq!(rows[2].value, "esriGeometryEnvelope (unsupported)");
    }

    #[test]
    fn test_field_table_renders() {
        let rows = vec![FieldRow {
            name: "OBJECTID".to_string(),
            field_type: "ObjectId".to_string(),
            alias: String::new(),
        }];
        let table = Table::new(rows).to_string();
        assert!(table.contains("Field"));
        assert!(table.contains("OBJECTID"));
        assert!(table.contains("ObjectId"));
    }
}
