//! `esri2sf-core` pulls the records of ArcGIS feature and map service layers
//! into simple-feature tables.
//!
//! This crate includes:
//! - **Transport**: the [`Transport`] seam and its `reqwest` implementation.
//! - **Queries**: object-id listing and batched, order-preserving feature
//!   fetching against a layer's `query` operation.
//! - **Operations**: [`convert`], the end-to-end pipeline, and
//!   [`describe_layer`] for layer metadata.
//! - **Tokens**: `generateToken` and OAuth client-credential helpers.
//! - **Output**: writing tables as `GeoJSON` or CSV files.
//!
//! Decoding of ESRI-JSON lives in the `esri-json` crate, whose table and
//! geometry types are re-exported here.
//!
//! ```no_run
//! use esri2sf_core::{ConvertOptions, HttpTransport, TransportConfig, convert};
//!
//! # async fn run() -> esri2sf_core::Result<()> {
//! let transport = HttpTransport::new(&TransportConfig::default())?;
//! let table = convert(
//!     &transport,
//!     "https://services.arcgis.com/example/arcgis/rest/services/Parcels/FeatureServer/0",
//!     &ConvertOptions::default().with_where("ACRES > 10"),
//! )
//! .await?;
//! println!("{} parcels", table.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod operations;
pub mod output;
pub mod query;
pub mod service;
pub mod token;
pub mod transport;
pub mod types;
pub mod utils;

pub use config::ConvertOptions;
pub use error::{
    ConfigError, Esri2SfError, GeometryError, OutputError, ProtocolError, Result, TransportError,
};
pub use esri_json::{
    AttributeValue, FeatureRow, FeatureTable, GeometryType, SfGeometry, WriterOptions,
};
pub use operations::{convert, describe_layer, parse_geometry_type};
pub use output::{OutputFormat, write_table};
pub use token::{TokenOptions, generate_oauth_token, generate_token};
pub use transport::{HttpTransport, Transport, TransportConfig};
pub use types::{FieldSummary, LayerSummary};
