//! Statement text for the schema, metadata and conversion helpers.

use std::fmt;

use crate::codec::{escape_value, quote_identifier};
use crate::error::Result;
use crate::types::{blob_literal, validate_hex, SqlValue};

/// Statement that prepares a fresh database for geometry columns.
pub const INIT_SPATIAL_METADATA: &str = "SELECT InitSpatialMetadata()";

/// Version row: `geos`, `proj4`, `sqlite`, `spatialite`, `targetCpu`.
pub const VERSIONS: &str = "SELECT geos_version() AS geos, proj4_version() AS proj4, \
     sqlite_version() AS sqlite, spatialite_version() AS spatialite, \
     spatialite_target_cpu() AS targetCpu";

pub const LIST_TABLES: &str = "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name";

/// SQLite storage class for [`add_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    Integer,
    Real,
    #[default]
    Text,
    Blob,
    Numeric,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
            ColumnType::Numeric => "NUMERIC",
        }
    }
}

/// Geometry type constraint for [`add_geometry_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryKind {
    Point,
    LineString,
    #[default]
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    Geometry,
}

impl GeometryKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
            GeometryKind::MultiPoint => "MULTIPOINT",
            GeometryKind::MultiLineString => "MULTILINESTRING",
            GeometryKind::MultiPolygon => "MULTIPOLYGON",
            GeometryKind::GeometryCollection => "GEOMETRYCOLLECTION",
            GeometryKind::Geometry => "GEOMETRY",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

fn text(value: &str) -> String {
    escape_value(&SqlValue::from(value))
}

/// `SELECT load_extension('<path>');` sent ahead of every shell payload.
pub fn load_extension(path: &str) -> String {
    format!("SELECT load_extension({});", text(path))
}

pub fn table_info(table: &str) -> String {
    format!("PRAGMA TABLE_INFO({})", quote_identifier(table))
}

pub fn create_table(table: &str) -> String {
    format!(
        "CREATE TABLE {} (id INTEGER NOT NULL PRIMARY KEY)",
        quote_identifier(table)
    )
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {}", quote_identifier(table))
}

pub fn empty_table(table: &str) -> String {
    format!("DELETE FROM {}", quote_identifier(table))
}

pub fn add_column(table: &str, column: &str, column_type: ColumnType) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_identifier(table),
        quote_identifier(column),
        column_type.as_sql()
    )
}

pub fn add_geometry_column(table: &str, column: &str, srid: i32, kind: GeometryKind) -> String {
    format!(
        "SELECT AddGeometryColumn({}, {}, {}, {}, 'XY')",
        text(table),
        text(column),
        escape_value(&SqlValue::from(srid)),
        text(kind.as_sql())
    )
}

pub fn srid(table: &str, column: Option<&str>) -> String {
    let mut sql = format!(
        "SELECT srid FROM geometry_columns WHERE f_table_name LIKE {}",
        text(table)
    );
    if let Some(column) = column.filter(|c| !c.is_empty()) {
        sql.push_str(" AND f_geometry_column LIKE ");
        sql.push_str(&text(column));
    }
    sql
}

pub fn max_id(table: &str, id_column: &str) -> String {
    format!(
        "SELECT max({}) FROM {}",
        quote_identifier(id_column),
        quote_identifier(table)
    )
}

pub fn hex_from_wkt(wkt: &str) -> String {
    format!("SELECT Hex(ST_GeomFromText({}))", text(wkt))
}

pub fn wkb_from_wkt(wkt: &str) -> String {
    format!("SELECT Hex(ST_AsBinary(ST_GeomFromText({})))", text(wkt))
}

pub fn wkt_from_wkb(wkb_hex: &str) -> Result<String> {
    validate_hex(wkb_hex)?;
    Ok(format!(
        "SELECT ST_AsText(ST_GeomFromWKB({}))",
        blob_literal(wkb_hex)
    ))
}

pub fn wkt_from_hex(hex: &str) -> Result<String> {
    validate_hex(hex)?;
    Ok(format!("SELECT ST_AsText({})", blob_literal(hex)))
}
