use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, LoadExtensionGuard};
use tracing::{debug, info, warn};

use crate::config::NativeConfig;
use crate::error::{Result, SpatialError};
use crate::shell::render;
use crate::traits::trace_statement;
use crate::traits::{QueryOptions, QueryOutput, SpatialDriver};
use crate::types::ResultSet;

/// Driver running statements on an in-process SQLite connection with the
/// spatial extension loaded.
///
/// Results are converted to the same text-or-NULL rows the shell driver
/// produces, and raw output uses the shell's delimited format.
#[derive(Debug)]
pub struct NativeDriver {
    conn: Connection,
}

impl NativeDriver {
    /// Open `db_path` and load `mod_spatialite` through the dynamic loader.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(db_path, NativeConfig::default())
    }

    pub fn with_config(db_path: impl AsRef<Path>, config: NativeConfig) -> Result<Self> {
        let db_path = db_path.as_ref();
        let is_new = !db_path.exists();
        let conn = Connection::open(db_path)
            .map_err(|e| SpatialError::engine(format!("opening {}", db_path.display()), e))?;
        Self::init(conn, &config, is_new)
    }

    /// A private in-memory database, always treated as new.
    pub fn open_in_memory(config: NativeConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SpatialError::engine("opening in-memory database", e))?;
        Self::init(conn, &config, true)
    }

    fn init(conn: Connection, config: &NativeConfig, is_new: bool) -> Result<Self> {
        if let Some(extension) = &config.extension {
            load_extension(&conn, extension)?;
        }
        let driver = Self { conn };
        if is_new && config.init_spatial_metadata {
            info!("initialising spatial metadata");
            driver.init_spatial_metadata()?;
        }
        Ok(driver)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Whether the extension named by `config` loads on this machine.
    /// A config without an extension needs nothing and always can.
    pub fn can_load_extension(config: &NativeConfig) -> bool {
        let Some(extension) = &config.extension else {
            return true;
        };
        let loaded = Connection::open_in_memory()
            .map_err(|e| SpatialError::engine("opening in-memory database", e))
            .and_then(|conn| load_extension(&conn, extension));
        match loaded {
            Ok(()) => true,
            Err(e) => {
                debug!(extension = %extension.display(), error = %e, "extension unavailable");
                false
            }
        }
    }

    /// Runs every statement in `sql`, returning one result per statement
    /// that produced rows.
    ///
    /// A statement failing inside a transaction this call opened rolls that
    /// transaction back, as the shell's process exit does.
    fn run_batch(&self, sql: &str) -> Result<Vec<ResultSet>> {
        let was_autocommit = self.conn.is_autocommit();
        let results = self.step_batch(sql);
        if results.is_err() && was_autocommit && !self.conn.is_autocommit() {
            warn!(sql, "statement failed inside an open transaction, rolling back");
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback failed");
            }
        }
        results
    }

    fn step_batch(&self, sql: &str) -> Result<Vec<ResultSet>> {
        let context = || format!("query `{sql}`");
        let mut batch = Batch::new(&self.conn, sql);
        let mut results = Vec::new();

        while let Some(mut stmt) = batch.next().map_err(|e| SpatialError::engine(context(), e))? {
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();

            let mut rows = stmt.query([]).map_err(|e| SpatialError::engine(context(), e))?;
            let mut values = Vec::new();
            while let Some(row) = rows.next().map_err(|e| SpatialError::engine(context(), e))? {
                let mut cells = Vec::with_capacity(columns.len());
                for index in 0..columns.len() {
                    let value = row
                        .get_ref(index)
                        .map_err(|e| SpatialError::engine(context(), e))?;
                    cells.push(cell_text(value));
                }
                values.push(cells);
            }

            // The shell prints nothing, not even a header, for a statement without rows.
            if !values.is_empty() {
                results.push(ResultSet::from_parts(columns, values)?);
            }
        }
        Ok(results)
    }
}

impl SpatialDriver for NativeDriver {
    /// Parsed output takes the rows of the one statement that produced any;
    /// several row-producing statements only have a raw form.
    fn query_with(&self, sql: &str, options: QueryOptions) -> Result<QueryOutput> {
        trace_statement(sql, options);
        let mut results = self.run_batch(sql)?;
        if !options.parse {
            return Ok(QueryOutput::Raw(results.iter().map(render).collect()));
        }
        match results.len() {
            0 => Ok(QueryOutput::Rows(ResultSet::empty())),
            1 => Ok(QueryOutput::Rows(results.remove(0))),
            count => Err(SpatialError::parse(
                format!("{count} statements produced rows, expected at most one"),
                sql,
            )),
        }
    }
}

fn load_extension(conn: &Connection, extension: &Path) -> Result<()> {
    debug!(extension = %extension.display(), "loading sqlite extension");
    let context = || format!("loading extension {}", extension.display());
    // SAFETY: the module comes from the caller's configuration and is
    // trusted like any other linked library.
    unsafe {
        let _guard = LoadExtensionGuard::new(conn).map_err(|e| SpatialError::engine(context(), e))?;
        conn.load_extension(extension, None::<&str>)
            .map_err(|e| SpatialError::engine(context(), e))
    }
}

/// Text the shell would print for a value; NULL stays `None`.
fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(real_text(f)),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Significant digits the shell prints for a REAL.
const REAL_DIGITS: usize = 15;

/// A REAL as the shell prints it, i.e. SQLite's `%!.15g`: 15 significant
/// digits, trailing zeros dropped but a `.0` kept, exponent form outside
/// `1e-4 <= |f| < 1e15`.
fn real_text(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }

    let scientific = format!("{f:.prec$e}", prec = REAL_DIGITS - 1);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    if exponent < -4 || exponent >= REAL_DIGITS as i32 {
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!(
            "{sign}{}.{}e{exp_sign}{:02}",
            &digits[..1],
            fraction(&digits[1..]),
            exponent.unsigned_abs()
        );
    }

    if exponent < 0 {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
        return format!("{sign}0.{}", fraction(&format!("{zeros}{digits}")));
    }
    let (whole, frac) = digits.split_at(exponent as usize + 1);
    format!("{sign}{whole}.{}", fraction(frac))
}

/// Fraction digits without trailing zeros, at least one digit.
fn fraction(digits: &str) -> &str {
    let trimmed = digits.trim_end_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> NativeDriver {
        let config = NativeConfig::default()
            .without_extension()
            .with_init_spatial_metadata(false);
        NativeDriver::open_in_memory(config).unwrap()
    }

    #[test]
    fn test_value_text() {
        let driver = driver();
        let row = driver
            .fetch_row(
                "SELECT 1 AS i, 2.5 AS r, 4.0 AS w, 'abc' AS t, NULL AS n, '' AS e",
                false,
            )
            .unwrap()
            .unwrap();
        assert_eq!(row.get("i").unwrap(), Some("1"));
        assert_eq!(row.get("r").unwrap(), Some("2.5"));
        assert_eq!(row.get("w").unwrap(), Some("4.0"));
        assert_eq!(row.get("t").unwrap(), Some("abc"));
        assert_eq!(row.get("n").unwrap(), None);
        assert_eq!(row.get("e").unwrap(), Some(""));

        let row = driver
            .fetch_row(
                "SELECT 0.1 + 0.2 AS a, 1e20 AS b, 1.0 AS c, 1e15 AS d, 0.0001 AS e, 0.00001 AS f",
                false,
            )
            .unwrap()
            .unwrap();
        let values: Vec<_> = row.iter().map(|(_, v)| v.unwrap()).collect();
        assert_eq!(values, ["0.3", "1.0e+20", "1.0", "1.0e+15", "0.0001", "1.0e-05"]);
    }

    #[test]
    fn test_real_text_matches_shell() {
        let cases = [
            (0.0, "0.0"),
            (-2.5, "-2.5"),
            (100.0, "100.0"),
            (1.0 / 3.0, "0.333333333333333"),
            (2.0 / 3.0, "0.666666666666667"),
            (123456.789, "123456.789"),
            (99999999999999.0, "99999999999999.0"),
            (999999999999999.0, "999999999999999.0"),
            (-1.5e-7, "-1.5e-07"),
            (6.02214076e23, "6.02214076e+23"),
            (1e100, "1.0e+100"),
            (f64::INFINITY, "Inf"),
            (f64::NEG_INFINITY, "-Inf"),
        ];
        for (value, expected) in cases {
            assert_eq!(real_text(value), expected, "formatting {value:?}");
        }
    }

    #[test]
    fn test_every_statement_runs() {
        let driver = driver();
        assert_eq!(driver.query_raw("CREATE TABLE a (x); CREATE TABLE b (y)").unwrap(), "");
        assert!(driver.has_table("a").unwrap());
        assert!(driver.has_table("b").unwrap());

        let id = driver
            .fetch_column(
                "BEGIN;\nINSERT INTO `a` DEFAULT VALUES;\nSELECT max(rowid) FROM `a`;\nEND;",
                false,
            )
            .unwrap();
        assert_eq!(id.as_deref(), Some("1"));
        assert!(driver.connection().is_autocommit());
    }

    #[test]
    fn test_raw_output_of_several_result_sets() {
        let driver = driver();
        let raw = driver.query_raw("SELECT 1 AS a; SELECT 2 AS b, 3 AS c").unwrap();
        assert_eq!(raw, "a\n1\nb\u{1f}c\n2\u{1f}3\n");
        assert!(matches!(
            driver.query("SELECT 1 AS a; SELECT 2 AS b"),
            Err(SpatialError::Parse { .. })
        ));
    }

    #[test]
    fn test_failed_batch_rolls_back_its_transaction() {
        let driver = driver();
        driver.exec("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();

        let result = driver.exec("BEGIN; INSERT INTO t VALUES (1); INSERT INTO missing VALUES (1); END;");
        assert!(matches!(result, Err(SpatialError::Engine { .. })));
        assert!(driver.connection().is_autocommit());
        assert_eq!(
            driver.fetch_column("SELECT count(*) FROM t", false).unwrap(),
            Some("0".to_string())
        );
    }

    #[test]
    fn test_failure_keeps_caller_transaction_open() {
        let driver = driver();
        driver.start_transaction().unwrap();
        assert!(driver.exec("INSERT INTO missing VALUES (1)").is_err());
        assert!(!driver.connection().is_autocommit());
        driver.stop_transaction().unwrap();
    }

    #[test]
    fn test_can_load_extension() {
        assert!(NativeDriver::can_load_extension(
            &NativeConfig::default().without_extension()
        ));
        assert!(!NativeDriver::can_load_extension(
            &NativeConfig::default().with_extension("/nonexistent/mod_nothing")
        ));
    }

    #[test]
    fn test_raw_output_uses_shell_format() {
        let driver = driver();
        let raw = driver.query_raw("SELECT 1 AS a, NULL AS b").unwrap();
        assert_eq!(raw, "a\u{1f}b\n1\u{1f}\u{1e}\n");
    }

    #[test]
    fn test_engine_error() {
        let driver = driver();
        match driver.query("SELECT * FROM missing_table").unwrap_err() {
            SpatialError::Engine { context, .. } => assert!(context.contains("missing_table")),
            other => panic!("Expected Engine error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_extension_fails_open() {
        let config = NativeConfig::default()
            .with_extension("/nonexistent/mod_nothing")
            .with_init_spatial_metadata(false);
        assert!(matches!(
            NativeDriver::open_in_memory(config),
            Err(SpatialError::Engine { .. })
        ));
    }
}
