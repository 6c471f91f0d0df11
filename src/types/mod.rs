mod geometry;
mod row;
mod sql_value;

pub(crate) use self::geometry::{blob_literal, validate_hex};
pub use self::geometry::{GeometryEncoding, GeometryValue};
pub use self::row::{ResultSet, Row};
pub use self::sql_value::SqlValue;
