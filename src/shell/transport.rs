use std::path::Path;

use tracing::{debug, warn};

use crate::builders::schema;
use crate::config::ShellConfig;
use crate::error::{Result, SpatialError};
use crate::shell::command::{shell_quote, ShellCommand};
use crate::shell::parser::ResultParser;
use crate::types::ResultSet;

/// Runs SQL through one shell process per call.
///
/// Every call pays full process startup, so related statements should be
/// sent as one multi-statement payload.
#[derive(Debug, Clone)]
pub struct ShellTransport {
    command: ShellCommand,
    /// Extension-load statement prepended to every payload.
    preamble: Option<String>,
    parser: ResultParser,
}

impl ShellTransport {
    pub fn new(db_path: &Path, config: &ShellConfig) -> Self {
        let preamble = config
            .extension
            .as_ref()
            .map(|path| schema::load_extension(&path.to_string_lossy()));
        Self {
            command: ShellCommand::new(&config.binary, db_path),
            preamble,
            parser: ResultParser::new(config.header_offset()),
        }
    }

    pub fn command(&self) -> &ShellCommand {
        &self.command
    }

    pub fn parser(&self) -> &ResultParser {
        &self.parser
    }

    pub fn loads_extension(&self) -> bool {
        self.preamble.is_some()
    }

    /// The complete invocation for `sql`, shell-quoted, with the
    /// extension-load statement and `sql` quoted as adjacent words.
    pub fn describe(&self, sql: &str) -> String {
        let mut described = self.command.to_string();
        described.push(' ');
        if let Some(preamble) = &self.preamble {
            described.push_str(&shell_quote(preamble));
        }
        described.push_str(&shell_quote(sql));
        described
    }

    /// Runs `sql` and returns the shell's stdout unparsed.
    ///
    /// A non-zero exit or any stderr output fails the whole call. The child
    /// is always waited for and both pipes drained before returning.
    pub fn execute(&self, sql: &str) -> Result<String> {
        let payload = match &self.preamble {
            Some(preamble) => format!("{preamble}{sql}"),
            None => sql.to_string(),
        };
        debug!(command = %self.command, sql, "spawning sqlite shell");

        let output = self.command.to_command(&payload).output().map_err(|e| {
            warn!(command = %self.command, error = %e, "failed to spawn sqlite shell");
            SpatialError::transport(self.describe(sql), format!("failed to spawn: {e}"), "")
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(command = %self.command, status = %output.status, "sqlite shell failed");
            let captured = if stderr.is_empty() { stdout.as_str() } else { stderr.as_ref() };
            return Err(SpatialError::transport(
                self.describe(sql),
                format!("exited with {}", output.status),
                captured,
            ));
        }
        if !stderr.is_empty() {
            warn!(command = %self.command, stderr = %stderr, "sqlite shell wrote to stderr");
            return Err(SpatialError::transport(
                self.describe(sql),
                "wrote to stderr",
                &stderr,
            ));
        }

        Ok(stdout)
    }

    /// Runs `sql` and parses its output.
    pub fn query(&self, sql: &str) -> Result<ResultSet> {
        let raw = self.execute(sql)?;
        self.parser.parse(&raw)
    }
}
