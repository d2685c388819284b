//! Writing converted tables to files.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use esri_json::{FeatureTable, WriterOptions, write_csv, write_geojson};
use log::info;

use crate::error::OutputError;

/// File formats a [`FeatureTable`] can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `GeoJSON` `FeatureCollection`
    GeoJson,
    /// CSV with a WKT geometry column
    Csv,
}

impl OutputFormat {
    /// Guess the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "geojson" | "json" => Some(OutputFormat::GeoJson),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::GeoJson => "GeoJSON",
            OutputFormat::Csv => "CSV",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geojson" | "json" => Ok(OutputFormat::GeoJson),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("unknown output format '{s}' (expected geojson or csv)")),
        }
    }
}

/// Write `table` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`OutputError::Create`] if the file cannot be created and
/// [`OutputError::Write`] if encoding or writing fails.
pub fn write_table(
    table: &FeatureTable,
    path: &Path,
    format: OutputFormat,
    options: &WriterOptions,
) -> Result<(), OutputError> {
    info!("Writing {} file: {}", format, path.display());
    let file = File::create(path).map_err(|source| OutputError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let write_error = |source: Box<dyn std::error::Error + Send + Sync>| OutputError::Write {
        format: format.name().to_string(),
        path: path.to_path_buf(),
        source,
    };

    match format {
        OutputFormat::GeoJson => {
            write_geojson(&mut writer, table, options).map_err(|e| write_error(Box::new(e)))?;
        },
        OutputFormat::Csv => {
            write_csv(&mut writer, table, options).map_err(|e| write_error(Box::new(e)))?;
        },
    }
    writer.flush().map_err(|e| write_error(Box::new(e)))?;

    info!("Wrote {} feature(s)", table.len());
    Ok(())
}
