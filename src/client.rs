use std::path::Path;

use crate::config::{NativeConfig, ShellConfig};
use crate::drivers::{NativeDriver, ShellDriver};
use crate::error::Result;
use crate::traits::SpatialDriver;

/// Which transport carries the SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// A `sqlite3` shell process per statement.
    Shell(ShellConfig),
    /// An in-process connection.
    Native(NativeConfig),
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Shell(ShellConfig::default())
    }
}

/// Open a spatial database through the chosen backend.
///
/// Callers only see [`SpatialDriver`], so switching transport does not
/// touch query code.
///
/// # Example
/// ```no_run
/// use spatialrs::{open, Backend, GeometryValue, NativeConfig, SpatialDriver};
///
/// let db = open("data/spatialite.sqlite", Backend::Native(NativeConfig::default()))?;
/// let id = db.insert(
///     "pois",
///     &[("Geometry", GeometryValue::wkt("SRID=4326;POINT(-74.00153 40.719885)")?.into())],
///     "id",
///     false,
/// )?;
/// let row = db.fetch_row(&format!("SELECT ST_AsText(Geometry) AS wkt FROM pois WHERE id = {id}"), false)?;
/// # Ok::<(), spatialrs::SpatialError>(())
/// ```
pub fn open(db_path: impl AsRef<Path>, backend: Backend) -> Result<Box<dyn SpatialDriver>> {
    Ok(match backend {
        Backend::Shell(config) => Box::new(ShellDriver::with_config(db_path, config)?),
        Backend::Native(config) => Box::new(NativeDriver::with_config(db_path, config)?),
    })
}
