//! Options for a conversion run.

use esri_json::GeometryType;

use crate::error::ConfigError;

/// Largest number of object ids requested in one feature query.
pub const MAX_BATCH_SIZE: usize = 500;

/// Spatial reference requested for all feature geometries.
pub const OUT_SR: &str = "4326";

/// Where clause selecting every record.
pub const ALL_RECORDS: &str = "1=1";

/// Options for [`convert`](crate::operations::convert).
///
/// # Examples
///
/// ```
/// use esri2sf_core::config::ConvertOptions;
/// use esri_json::GeometryType;
///
/// let options = ConvertOptions::default()
///     .with_out_fields(["NAME", "POP2020"])
///     .with_where("POP2020 > 100000")
///     .with_geometry_type(GeometryType::Point);
/// assert!(options.validate().is_ok());
/// assert_eq!(options.out_fields_param(), "NAME,POP2020");
/// ```
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Fields to return; `*` selects all fields.
    pub out_fields: Vec<String>,
    /// SQL where clause filtering the records.
    pub where_clause: String,
    /// Token sent with every request; empty for public services.
    pub token: String,
    /// Geometry type of the layer. When `None` it is read from the layer
    /// metadata.
    pub geometry_type: Option<GeometryType>,
    /// Object ids per feature query.
    pub batch_size: usize,
    /// Feature queries in flight at once.
    pub concurrency: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            out_fields: vec!["*".to_string()],
            where_clause: ALL_RECORDS.to_string(),
            token: String::new(),
            geometry_type: None,
            batch_size: MAX_BATCH_SIZE,
            concurrency: 1,
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn with_out_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.out_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_where(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = where_clause.into();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    #[must_use]
    pub fn with_geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = Some(geometry_type);
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// The `outFields` request parameter.
    #[must_use]
    pub fn out_fields_param(&self) -> String {
        self.out_fields.join(",")
    }

    /// Check option values before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for an empty field list or
    /// where clause, a batch size outside `1..=500`, or a concurrency of 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.out_fields.is_empty() || self.out_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::InvalidOption {
                option: "out_fields".to_string(),
                message: "field names must not be empty; use \"*\" for all fields".to_string(),
            });
        }
        if self.where_clause.trim().is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "where".to_string(),
                message: format!("where clause must not be empty; use \"{ALL_RECORDS}\" for all records"),
            });
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ConfigError::InvalidOption {
                option: "batch_size".to_string(),
                message: format!(
                    "{} is outside 1..={MAX_BATCH_SIZE}",
                    self.batch_size
                ),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidOption {
                option: "concurrency".to_string(),
                message: "at least one request must be allowed in flight".to_string(),
            });
        }
        Ok(())
    }
}
