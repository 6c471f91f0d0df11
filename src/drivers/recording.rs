use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::shell::render;
use crate::traits::{trace_statement, QueryOptions, QueryOutput, SpatialDriver};
use crate::types::ResultSet;

/// A recorded statement execution for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub options: QueryOptions,
}

/// A driver that records statements instead of running them.
///
/// Allows configuring the rows returned and verifying the exact SQL text the
/// provided [`SpatialDriver`] methods generate.
///
/// # Example
/// ```
/// use spatialrs::drivers::{RecordingDriver, RecordingResponseBuilder};
/// use spatialrs::SpatialDriver;
///
/// let driver = RecordingDriver::new().with_response(
///     RecordingResponseBuilder::new()
///         .columns(&["max(`id`)"])
///         .row(&["7"])
///         .build()
///         .unwrap(),
/// );
/// assert_eq!(driver.get_last_insert_id("pois", Some("id")).unwrap(), Some(7));
/// driver.assert_last_query("SELECT max(`id`) FROM `pois`");
/// ```
pub struct RecordingDriver {
    responses: Mutex<VecDeque<ResultSet>>,
    recorded_queries: Mutex<Vec<RecordedQuery>>,
    default_response: ResultSet,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingDriver {
    /// Create a new recording driver with no pre-configured responses.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            recorded_queries: Mutex::new(Vec::new()),
            default_response: ResultSet::empty(),
        }
    }

    /// Add a response to be returned by the next statement.
    /// Responses are returned in FIFO order.
    pub fn with_response(self, response: ResultSet) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    /// Add multiple responses to be returned by subsequent statements.
    pub fn with_responses(self, responses: impl IntoIterator<Item = ResultSet>) -> Self {
        lock(&self.responses).extend(responses);
        self
    }

    /// Set a default response to use when no queued responses remain.
    pub fn with_default_response(mut self, response: ResultSet) -> Self {
        self.default_response = response;
        self
    }

    /// Get all recorded statements.
    pub fn recorded_queries(&self) -> Vec<RecordedQuery> {
        lock(&self.recorded_queries).clone()
    }

    /// Recorded SQL text only, in execution order.
    pub fn recorded_sql(&self) -> Vec<String> {
        lock(&self.recorded_queries)
            .iter()
            .map(|q| q.sql.clone())
            .collect()
    }

    /// Get the last recorded statement, if any.
    pub fn last_query(&self) -> Option<RecordedQuery> {
        lock(&self.recorded_queries).last().cloned()
    }

    /// Clear all recorded statements.
    pub fn clear_recorded_queries(&self) {
        lock(&self.recorded_queries).clear();
    }

    /// Assert that the last statement matches the expected SQL.
    pub fn assert_last_query(&self, expected_sql: &str) {
        let last = self.last_query();
        let actual = last.as_ref().map(|q| q.sql.as_str());
        assert_eq!(
            actual,
            Some(expected_sql),
            "SQL mismatch.\nExpected: {}\nActual: {:?}",
            expected_sql,
            actual
        );
    }

    /// Assert that exactly n statements were executed.
    pub fn assert_query_count(&self, expected: usize) {
        let actual = lock(&self.recorded_queries).len();
        assert_eq!(
            actual, expected,
            "Query count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialDriver for RecordingDriver {
    fn query_with(&self, sql: &str, options: QueryOptions) -> Result<QueryOutput> {
        trace_statement(sql, options);
        lock(&self.recorded_queries).push(RecordedQuery {
            sql: sql.to_string(),
            options,
        });

        // Return next queued response or default
        let response = lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone());

        if options.parse {
            Ok(QueryOutput::Rows(response))
        } else {
            Ok(QueryOutput::Raw(render(&response)))
        }
    }
}

/// Builder for creating recorded responses easily.
pub struct RecordingResponseBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RecordingResponseBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Set the column names for the response.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a row of non-NULL values.
    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows
            .push(values.iter().map(|s| Some(s.to_string())).collect());
        self
    }

    /// Add a row where `None` stands for NULL.
    pub fn row_opt(mut self, values: &[Option<&str>]) -> Self {
        self.rows
            .push(values.iter().map(|v| v.map(str::to_string)).collect());
        self
    }

    /// Build the response; fails if a row's width differs from the columns.
    pub fn build(self) -> Result<ResultSet> {
        ResultSet::from_parts(self.columns, self.rows)
    }
}

impl Default for RecordingResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
