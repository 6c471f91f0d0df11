mod insert;
pub mod schema;

pub use self::insert::Insert;
pub use self::schema::{ColumnType, GeometryKind};
