mod driver;

pub(crate) use driver::{inserted_id, resolve_id_column, trace_statement};
pub use driver::{QueryOptions, QueryOutput, SpatialDriver};
