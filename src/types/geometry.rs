use std::fmt;
use std::str::FromStr;

use crate::codec::escape_value;
use crate::error::{Result, SpatialError};
use crate::types::SqlValue;

const EWKT_PREFIX: &str = "SRID=";

/// Textual encoding carried by a [`GeometryValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryEncoding {
    /// Well-known text, optionally with an EWKT `SRID=<id>;` prefix.
    Wkt,
    /// Hex digits of a binary geometry, rendered as a blob literal.
    Wkb,
    /// Engine-ready SQL emitted verbatim.
    Hex,
}

/// A spatial value to be embedded into generated SQL.
///
/// The payload is normalised once, when it is set: a WKT payload of the
/// form `SRID=4326;POINT(1 2)` is split into its SRID and plain WKT.
/// Rendering never re-inspects the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryValue {
    encoding: GeometryEncoding,
    payload: String,
    srid: i32,
}

impl GeometryValue {
    /// Creates a geometry with an unspecified SRID (0), unless the payload
    /// is EWKT carrying its own.
    pub fn new(payload: impl Into<String>, encoding: GeometryEncoding) -> Result<Self> {
        Self::with_srid(payload, encoding, 0)
    }

    /// Creates a geometry with an explicit SRID. An EWKT prefix in the
    /// payload takes precedence over `srid`.
    pub fn with_srid(
        payload: impl Into<String>,
        encoding: GeometryEncoding,
        srid: i32,
    ) -> Result<Self> {
        let mut value = Self {
            encoding,
            payload: String::new(),
            srid,
        };
        value.replace_value(payload)?;
        Ok(value)
    }

    pub fn wkt(payload: impl Into<String>) -> Result<Self> {
        Self::new(payload, GeometryEncoding::Wkt)
    }

    pub fn wkb(hex: impl Into<String>) -> Result<Self> {
        Self::new(hex, GeometryEncoding::Wkb)
    }

    pub fn hex(raw: impl Into<String>) -> Result<Self> {
        Self::new(raw, GeometryEncoding::Hex)
    }

    /// Replaces the payload, applying the same normalisation as construction.
    /// On error the value is left unchanged.
    pub fn replace_value(&mut self, payload: impl Into<String>) -> Result<()> {
        let payload = payload.into();
        match self.encoding {
            GeometryEncoding::Wkt => match split_ewkt(&payload)? {
                Some((srid, wkt)) => {
                    self.payload = wkt.to_string();
                    self.srid = srid;
                }
                None => self.payload = payload,
            },
            GeometryEncoding::Wkb => {
                validate_hex(&payload)?;
                self.payload = payload;
            }
            GeometryEncoding::Hex => self.payload = payload,
        }
        Ok(())
    }

    pub fn encoding(&self) -> GeometryEncoding {
        self.encoding
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Coordinate system id; 0 means unspecified.
    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// Renders the value as a SQL expression.
    pub fn to_sql(&self) -> String {
        match self.encoding {
            GeometryEncoding::Wkt => format!(
                "GeomFromText({}, {})",
                escape_value(&SqlValue::Text(self.payload.clone())),
                escape_value(&SqlValue::Int32(self.srid))
            ),
            GeometryEncoding::Wkb => blob_literal(&self.payload),
            GeometryEncoding::Hex => self.payload.clone(),
        }
    }
}

impl fmt::Display for GeometryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl FromStr for GeometryValue {
    type Err = SpatialError;

    /// Parses WKT or EWKT.
    fn from_str(s: &str) -> Result<Self> {
        Self::wkt(s)
    }
}

/// Splits `SRID=<digits>;<wkt>` into its parts. Returns `None` when the
/// prefix is absent.
fn split_ewkt(text: &str) -> Result<Option<(i32, &str)>> {
    let Some(rest) = text.strip_prefix(EWKT_PREFIX) else {
        return Ok(None);
    };
    let (digits, wkt) = rest
        .split_once(';')
        .ok_or_else(|| SpatialError::Value(format!("EWKT prefix without ';': {text}")))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SpatialError::Value(format!("EWKT SRID is not numeric: {digits:?}")));
    }
    let srid = digits
        .parse::<i32>()
        .map_err(|e| SpatialError::Value(format!("EWKT SRID {digits} out of range: {e}")))?;
    if wkt.is_empty() {
        return Err(SpatialError::Value(format!("EWKT without geometry: {text}")));
    }
    Ok(Some((srid, wkt)))
}

/// Checks that `hex` can be embedded in a blob literal.
pub(crate) fn validate_hex(hex: &str) -> Result<()> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SpatialError::Value(format!(
            "expected an even number of hex digits, got {hex:?}"
        )));
    }
    Ok(())
}

/// `x'<hex>'`, SQLite's blob literal. Callers validate `hex` first.
pub(crate) fn blob_literal(hex: &str) -> String {
    format!("x'{hex}'")
}
