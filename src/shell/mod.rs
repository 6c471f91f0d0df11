//! The shell-transport protocol: command template, subprocess run, output parsing.

mod command;
mod parser;
mod transport;

pub use self::command::{shell_quote, ShellCommand, CELL_SEPARATOR, NULL_SENTINEL, ROW_SEPARATOR};
pub use self::parser::{render, ResultParser};
pub use self::transport::ShellTransport;
