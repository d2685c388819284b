//! Helpers for presenting ArcGIS metadata.

/// Extension trait turning ESRI field type names into short labels.
///
/// # Examples
///
/// ```
/// use esri2sf_core::utils::EsriFieldTypeExt;
///
/// assert_eq!("esriFieldTypeOID".format_field_type(), "ObjectId");
/// assert_eq!("esriFieldTypeString".format_field_type(), "String");
/// ```
pub trait EsriFieldTypeExt {
    /// Format the field type into a human-readable string.
    fn format_field_type(&self) -> String;
}

impl EsriFieldTypeExt for str {
    fn format_field_type(&self) -> String {
        match self {
            "esriFieldTypeOID" => "ObjectId".to_string(),
            "esriFieldTypeGlobalID" => "GlobalId".to_string(),
            "esriFieldTypeGUID" => "Guid".to_string(),
            "esriFieldTypeSmallInteger" => "Int16".to_string(),
            "esriFieldTypeInteger" => "Int32".to_string(),
            "esriFieldTypeBigInteger" => "Int64".to_string(),
            "esriFieldTypeSingle" => "Float32".to_string(),
            "esriFieldTypeDouble" => "Float64".to_string(),
            "esriFieldTypeString" => "String".to_string(),
            "esriFieldTypeDate" => "Date".to_string(),
            "esriFieldTypeDateOnly" => "DateOnly".to_string(),
            "esriFieldTypeTimeOnly" => "TimeOnly".to_string(),
            "esriFieldTypeTimestampOffset" => "TimestampOffset".to_string(),
            "esriFieldTypeGeometry" => "Geometry".to_string(),
            "esriFieldTypeBlob" => "Blob".to_string(),
            "esriFieldTypeRaster" => "Raster".to_string(),
            "esriFieldTypeXML" => "Xml".to_string(),
            other => other
                .strip_prefix("esriFieldType")
                .unwrap_or(other)
                .to_string(),
        }
    }
}
