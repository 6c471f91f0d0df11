use std::path::Path;

use tracing::info;

use crate::builders::{schema, Insert};
use crate::config::ShellConfig;
use crate::error::Result;
use crate::shell::ShellTransport;
use crate::traits::{inserted_id, resolve_id_column, trace_statement};
use crate::traits::{QueryOptions, QueryOutput, SpatialDriver};
use crate::types::SqlValue;

/// Driver that runs every statement through a `sqlite3` shell process.
///
/// Each call is a separate process, so `start_transaction` and
/// `stop_transaction` do not span calls; work that must be atomic goes into
/// one multi-statement payload, as [`insert`](SpatialDriver::insert) does.
#[derive(Debug, Clone)]
pub struct ShellDriver {
    transport: ShellTransport,
}

impl ShellDriver {
    /// Open `db_path` with the default installation layout.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(db_path, ShellConfig::default())
    }

    /// Open `db_path`. A database file that does not exist yet is created by
    /// the shell and, if configured, given spatial metadata.
    pub fn with_config(db_path: impl AsRef<Path>, config: ShellConfig) -> Result<Self> {
        let db_path = db_path.as_ref();
        let is_new = !db_path.exists();
        let driver = Self {
            transport: ShellTransport::new(db_path, &config),
        };
        if is_new && config.init_spatial_metadata {
            info!(path = %db_path.display(), "initialising spatial metadata");
            driver.init_spatial_metadata()?;
        }
        Ok(driver)
    }

    pub fn transport(&self) -> &ShellTransport {
        &self.transport
    }
}

impl SpatialDriver for ShellDriver {
    fn query_with(&self, sql: &str, options: QueryOptions) -> Result<QueryOutput> {
        trace_statement(sql, options);
        if options.parse {
            Ok(QueryOutput::Rows(self.transport.query(sql)?))
        } else {
            Ok(QueryOutput::Raw(self.transport.execute(sql)?))
        }
    }

    /// Insert and read back the id in a single shell invocation.
    fn insert(
        &self,
        table: &str,
        values: &[(&str, SqlValue)],
        id_column: &str,
        debug: bool,
    ) -> Result<i64> {
        let id_column = resolve_id_column(self, table, id_column)?;
        let sql = format!(
            "BEGIN;\n{};\n{};\nEND;",
            Insert::into_table(table).values(values).build_sql(),
            schema::max_id(table, &id_column)
        );
        let id = self.fetch_column(&sql, debug)?;
        inserted_id(table, id)
    }
}
