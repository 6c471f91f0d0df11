use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Cell separator passed to `-separator` (ASCII unit separator).
pub const CELL_SEPARATOR: char = '\u{1f}';
/// Marker passed to `-nullvalue` (ASCII record separator).
pub const NULL_SENTINEL: &str = "\u{1e}";
/// Row separator of the shell's list output mode.
pub const ROW_SEPARATOR: char = '\n';

/// The fixed part of a shell invocation:
/// `<binary> -separator <US> -nullvalue <RS> -header <db>`.
///
/// Built once per driver; each call appends only its SQL payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ShellCommand {
    pub fn new(program: impl Into<PathBuf>, db_path: &Path) -> Self {
        let args = vec![
            OsString::from("-separator"),
            OsString::from(CELL_SEPARATOR.to_string()),
            OsString::from("-nullvalue"),
            OsString::from(NULL_SENTINEL),
            OsString::from("-header"),
            db_path.as_os_str().to_owned(),
        ];
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Fixed arguments, ending with the database path.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// A runnable command with `payload` as the final argument.
    /// Arguments are passed directly, never through a shell.
    pub(crate) fn to_command(&self, payload: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(payload);
        command
    }
}

/// Renders the invocation as a POSIX shell would need it typed, for logs
/// and error messages.
impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Single-quotes `arg` for a POSIX shell.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}
