//! ESRI-JSON reading for ArcGIS feature services.
//!
//! This crate has no network code. It covers:
//! - **Responses**: serde models of layer metadata, object-id and feature
//!   query bodies, with ArcGIS error envelopes surfaced as errors.
//! - **Geometry**: decoding of ESRI-JSON points, multipoints, polylines and
//!   polygons into simple-feature geometries built on `geo-types`.
//! - **Tables**: assembly of decoded features and their attributes into a
//!   [`FeatureTable`] in EPSG:4326.
//! - **Writers**: `GeoJSON`, Arrow and CSV export of tables.

pub mod error;
pub mod geometry;
pub mod response;
pub mod table;
pub mod writer;

pub use error::{EsriJsonError, EsriJsonResult};
pub use geometry::{GeometryType, SfGeometry, decode_geometry};
pub use response::{
    FeatureQueryResponse, FieldDescriptor, JsonObject, LayerInfo, ObjectIdsResponse, RawFeature,
    parse_feature_response, parse_layer_info, parse_object_ids,
};
pub use table::{AttributeValue, FeatureRow, FeatureTable, WGS84_CRS, build_feature_table};
pub use writer::{
    WriterOptions, geometry_to_wkt, to_feature_collection, to_record_batch, write_csv,
    write_geojson,
};
