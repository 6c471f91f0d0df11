//! spatialrs - A uniform driver layer over a SpatiaLite database
//!
//! Two interchangeable backends implement the same [`SpatialDriver`]
//! contract: [`drivers::ShellDriver`] runs each statement through a
//! `sqlite3` shell process and parses its delimited output, and
//! [`drivers::NativeDriver`] uses an in-process connection. Both generate
//! identical SQL through [`codec`] and return text-or-NULL [`Row`]s.
//!
//! # Example
//! ```no_run
//! use spatialrs::drivers::ShellDriver;
//! use spatialrs::{GeometryKind, GeometryValue, ShellConfig, SpatialDriver};
//!
//! let config = ShellConfig::installed_in("/opt/spatialite/bin");
//! let db = ShellDriver::with_config("pois.sqlite", config)?;
//!
//! if !db.has_table("pois")? {
//!     db.create_table("pois")?;
//!     db.add_geometry_column("pois", "Geometry", 4326, GeometryKind::Point)?;
//! }
//!
//! let point = GeometryValue::wkt("SRID=4326;POINT(-74.00153 40.719885)")?;
//! let id = db.insert("pois", &[("Geometry", point.into())], "id", false)?;
//! let wkt = db.fetch_column(
//!     &format!("SELECT ST_AsText(Geometry) FROM pois WHERE id = {id}"),
//!     false,
//! )?;
//! # Ok::<(), spatialrs::SpatialError>(())
//! ```

pub mod builders;
pub mod codec;
pub mod config;
pub mod drivers;
pub mod error;
pub mod shell;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use builders::{ColumnType, GeometryKind};
pub use client::{open, Backend};
pub use config::{NativeConfig, ShellConfig};
pub use error::{Result, SpatialError};
pub use traits::{QueryOptions, QueryOutput, SpatialDriver};
pub use types::{GeometryEncoding, GeometryValue, ResultSet, Row, SqlValue};
