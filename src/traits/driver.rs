use tracing::{info, trace};

use crate::builders::{schema, ColumnType, GeometryKind, Insert};
use crate::error::{Result, SpatialError};
use crate::types::{ResultSet, Row, SqlValue};

/// Options for [`SpatialDriver::query_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Parse output into rows; otherwise return the transport's raw text.
    pub parse: bool,
    /// Log the exact statement at `info` level before running it.
    pub debug: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            parse: true,
            debug: false,
        }
    }
}

impl QueryOptions {
    /// Unparsed output.
    pub fn raw() -> Self {
        Self {
            parse: false,
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// What a query returns, depending on [`QueryOptions::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(ResultSet),
    Raw(String),
}

impl QueryOutput {
    pub fn into_rows(self) -> Result<ResultSet> {
        match self {
            QueryOutput::Rows(rows) => Ok(rows),
            QueryOutput::Raw(raw) => Err(SpatialError::parse(
                "driver returned raw output for a parsed query",
                &raw,
            )),
        }
    }

    pub fn into_raw(self) -> Option<String> {
        match self {
            QueryOutput::Raw(raw) => Some(raw),
            QueryOutput::Rows(_) => None,
        }
    }
}

/// The driver contract shared by the shell and in-process backends.
///
/// Implementations provide [`query_with`](Self::query_with); everything
/// else is built on it and produces the same SQL text on every backend.
/// Backends override a provided method only where their transport calls
/// for it (e.g. batching).
///
/// `start_transaction`/`stop_transaction` are a bare `BEGIN`/`END` pair
/// with no nesting and no rollback on error.
pub trait SpatialDriver {
    /// Execute `sql`, returning rows or raw output.
    fn query_with(&self, sql: &str, options: QueryOptions) -> Result<QueryOutput>;

    /// Execute `sql` and parse its rows.
    fn query(&self, sql: &str) -> Result<ResultSet> {
        self.query_with(sql, QueryOptions::default())?.into_rows()
    }

    /// Execute `sql` and return the transport's unparsed output.
    fn query_raw(&self, sql: &str) -> Result<String> {
        match self.query_with(sql, QueryOptions::raw())? {
            QueryOutput::Raw(raw) => Ok(raw),
            QueryOutput::Rows(rows) => Ok(crate::shell::render(&rows)),
        }
    }

    /// Execute `sql`, discarding any output.
    fn exec(&self, sql: &str) -> Result<()> {
        self.query_with(sql, QueryOptions::raw()).map(drop)
    }

    /// First row of the result, if any.
    fn fetch_row(&self, sql: &str, debug: bool) -> Result<Option<Row>> {
        let rows = self
            .query_with(sql, QueryOptions::default().with_debug(debug))?
            .into_rows()?;
        Ok(rows.into_first())
    }

    /// First column of the first row; `None` for no rows or NULL.
    fn fetch_column(&self, sql: &str, debug: bool) -> Result<Option<String>> {
        Ok(self
            .fetch_row(sql, debug)?
            .and_then(|row| row.into_values().into_iter().next().flatten()))
    }

    fn start_transaction(&self) -> Result<()> {
        self.exec("BEGIN")
    }

    fn stop_transaction(&self) -> Result<()> {
        self.exec("END")
    }

    /// Insert one row and return `max(id_column)` read inside the same
    /// transaction. An empty `id_column` resolves to the table's first column.
    fn insert(
        &self,
        table: &str,
        values: &[(&str, SqlValue)],
        id_column: &str,
        debug: bool,
    ) -> Result<i64> {
        let sql = Insert::into_table(table).values(values).build_sql();
        let id_column = resolve_id_column(self, table, id_column)?;

        self.start_transaction()?;
        self.query_with(&sql, QueryOptions::raw().with_debug(debug))?;
        let id = self.fetch_column(&schema::max_id(table, &id_column), debug)?;
        self.stop_transaction()?;

        inserted_id(table, id)
    }

    /// `max(id_column)` of `table`; `None` while the table is empty.
    /// `None` or an empty `id_column` resolves to the table's first column.
    fn get_last_insert_id(&self, table: &str, id_column: Option<&str>) -> Result<Option<i64>> {
        let id_column = resolve_id_column(self, table, id_column.unwrap_or_default())?;
        self.fetch_column(&schema::max_id(table, &id_column), false)?
            .map(|value| parse_integer(&value))
            .transpose()
    }

    /// `PRAGMA TABLE_INFO` rows: `cid`, `name`, `type`, `notnull`, `dflt_value`, `pk`.
    fn get_table_info(&self, table: &str) -> Result<ResultSet> {
        self.query(&schema::table_info(table))
    }

    fn has_table(&self, table: &str) -> Result<bool> {
        Ok(!self.get_table_info(table)?.is_empty())
    }

    /// Create `table` with a single `id INTEGER NOT NULL PRIMARY KEY` column.
    fn create_table(&self, table: &str) -> Result<()> {
        self.exec(&schema::create_table(table))
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        self.exec(&schema::drop_table(table))
    }

    /// Delete every row of `table`.
    fn empty_table(&self, table: &str) -> Result<()> {
        self.exec(&schema::empty_table(table))
    }

    fn add_column(&self, table: &str, column: &str, column_type: ColumnType) -> Result<()> {
        self.exec(&schema::add_column(table, column, column_type))
    }

    /// Register an XY geometry column; true if the engine accepted it.
    fn add_geometry_column(
        &self,
        table: &str,
        column: &str,
        srid: i32,
        kind: GeometryKind,
    ) -> Result<bool> {
        let accepted = self.fetch_column(&schema::add_geometry_column(table, column, srid, kind), false)?;
        Ok(accepted.as_deref() == Some("1"))
    }

    /// SRID registered for a geometry column of `table`.
    fn get_srid(&self, table: &str, column: Option<&str>) -> Result<Option<i32>> {
        self.fetch_column(&schema::srid(table, column), false)?
            .map(|value| {
                value.parse::<i32>().map_err(|e| {
                    SpatialError::parse(format!("SRID is not an integer: {e}"), &value)
                })
            })
            .transpose()
    }

    fn list_table_names(&self) -> Result<Vec<String>> {
        Ok(self
            .query(schema::LIST_TABLES)?
            .into_iter()
            .filter_map(|row| row.into_values().into_iter().next().flatten())
            .collect())
    }

    /// Versions of the engine and its spatial libraries.
    fn get_versions(&self) -> Result<Option<Row>> {
        self.fetch_row(schema::VERSIONS, false)
    }

    /// Create the spatial metadata tables of a fresh database.
    fn init_spatial_metadata(&self) -> Result<()> {
        self.exec(schema::INIT_SPATIAL_METADATA)
    }

    fn hex_from_wkt(&self, wkt: &str) -> Result<Option<String>> {
        self.fetch_column(&schema::hex_from_wkt(wkt), false)
    }

    fn wkb_from_wkt(&self, wkt: &str) -> Result<Option<String>> {
        self.fetch_column(&schema::wkb_from_wkt(wkt), false)
    }

    fn wkt_from_wkb(&self, wkb_hex: &str) -> Result<Option<String>> {
        self.fetch_column(&schema::wkt_from_wkb(wkb_hex)?, false)
    }

    fn wkt_from_hex(&self, hex: &str) -> Result<Option<String>> {
        self.fetch_column(&schema::wkt_from_hex(hex)?, false)
    }
}

/// Logs a statement about to run; `debug` echoes it at `info` level.
pub(crate) fn trace_statement(sql: &str, options: QueryOptions) {
    if options.debug {
        info!(target: "spatialrs::sql", sql, "executing statement");
    } else {
        trace!(target: "spatialrs::sql", sql, "executing statement");
    }
}

/// Empty names resolve to the first column reported by `PRAGMA TABLE_INFO`.
pub(crate) fn resolve_id_column<D: SpatialDriver + ?Sized>(
    driver: &D,
    table: &str,
    id_column: &str,
) -> Result<String> {
    if !id_column.is_empty() {
        return Ok(id_column.to_string());
    }
    let info = driver.get_table_info(table)?;
    match info.first() {
        Some(row) => row
            .get("name")?
            .map(str::to_string)
            .ok_or_else(|| SpatialError::ColumnNotFound(format!("{table}: unnamed first column"))),
        None => Err(SpatialError::ColumnNotFound(format!("{table}: no columns"))),
    }
}

/// The id read back after an insert; the table cannot be empty at that point.
pub(crate) fn inserted_id(table: &str, id: Option<String>) -> Result<i64> {
    let id = id.ok_or_else(|| {
        SpatialError::parse(format!("max id of `{table}` is NULL after insert"), "")
    })?;
    parse_integer(&id)
}

fn parse_integer(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|e| SpatialError::parse(format!("expected an integer id: {e}"), value))
}
