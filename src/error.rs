use thiserror::Error;

/// Upper bound on captured output embedded in an error.
const SAMPLE_LIMIT: usize = 512;

/// Error type for spatialrs operations
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The shell could not be spawned, exited non-zero, or wrote to stderr.
    #[error("Transport failed running `{command}`: {reason}\n{output}")]
    Transport {
        command: String,
        reason: String,
        output: String,
    },

    /// Output was present but did not have the expected banner/header/row shape.
    #[error("Malformed result output: {reason}")]
    Parse { reason: String, sample: String },

    #[error("Invalid value: {0}")]
    Value(String),

    /// The in-process engine rejected a statement or could not be opened.
    #[error("Engine error during {context}: {source}")]
    Engine {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

impl SpatialError {
    pub(crate) fn transport(
        command: impl Into<String>,
        reason: impl Into<String>,
        output: &str,
    ) -> Self {
        SpatialError::Transport {
            command: command.into(),
            reason: reason.into(),
            output: sample(output),
        }
    }

    pub(crate) fn parse(reason: impl Into<String>, raw: &str) -> Self {
        SpatialError::Parse {
            reason: reason.into(),
            sample: sample(raw),
        }
    }

    pub(crate) fn engine(context: impl Into<String>, source: rusqlite::Error) -> Self {
        SpatialError::Engine {
            context: context.into(),
            source,
        }
    }
}

/// Truncates `text` to at most [`SAMPLE_LIMIT`] bytes on a char boundary.
fn sample(text: &str) -> String {
    if text.len() <= SAMPLE_LIMIT {
        return text.to_string();
    }
    let mut end = SAMPLE_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], text.len())
}

/// Result type alias for spatialrs operations
pub type Result<T> = std::result::Result<T, SpatialError>;
