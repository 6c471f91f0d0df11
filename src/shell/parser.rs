use crate::error::{Result, SpatialError};
use crate::shell::command::{CELL_SEPARATOR, NULL_SENTINEL, ROW_SEPARATOR};
use crate::types::ResultSet;

/// Turns the shell's delimited list output into rows.
///
/// The header is found `header_offset` lines into the output; the lines
/// before it are banner output of the extension-load statement. Values are
/// kept as text, the null sentinel becomes `None`.
///
/// Cell data containing the separator, the null sentinel or a newline
/// cannot be told apart from the framing and fails as a cell-count mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultParser {
    header_offset: usize,
}

impl ResultParser {
    pub fn new(header_offset: usize) -> Self {
        Self { header_offset }
    }

    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn parse(&self, raw: &str) -> Result<ResultSet> {
        let lines: Vec<&str> = raw.split(ROW_SEPARATOR).collect();

        // Output ends with a row separator, leaving one empty trailing segment.
        let usable = lines.len() - 1;
        if !lines[usable].is_empty() {
            return Err(SpatialError::parse(
                "output does not end with a row separator",
                raw,
            ));
        }

        let header_index = self.header_offset;
        if header_index > usable {
            return Err(SpatialError::parse(
                format!("expected {header_index} banner line(s), output has {usable} line(s)"),
                raw,
            ));
        }
        // Banner only: the statement produced no rows, so the shell printed no header.
        if header_index == usable {
            return Ok(ResultSet::empty());
        }

        let columns: Vec<String> = lines[header_index]
            .split(CELL_SEPARATOR)
            .map(str::to_string)
            .collect();

        let mut rows = Vec::with_capacity(usable - header_index - 1);
        for (index, line) in lines.iter().enumerate().take(usable).skip(header_index + 1) {
            let cells: Vec<Option<String>> = line
                .split(CELL_SEPARATOR)
                .map(|cell| (cell != NULL_SENTINEL).then(|| cell.to_string()))
                .collect();
            if cells.len() != columns.len() {
                return Err(SpatialError::parse(
                    format!(
                        "line {index} has {} cell(s), header has {}",
                        cells.len(),
                        columns.len()
                    ),
                    raw,
                ));
            }
            rows.push(cells);
        }

        ResultSet::from_parts(columns, rows)
    }
}

/// Renders rows in the shell's output format, without a banner. An empty
/// result renders as empty output, as the shell prints no header for it.
pub fn render(result: &ResultSet) -> String {
    let mut out = String::new();
    if result.is_empty() {
        return out;
    }
    push_line(&mut out, result.columns().iter().map(String::as_str));
    for row in result.rows() {
        push_line(
            &mut out,
            row.values().iter().map(|v| v.as_deref().unwrap_or(NULL_SENTINEL)),
        );
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(CELL_SEPARATOR);
        }
        out.push_str(cell);
    }
    out.push(ROW_SEPARATOR);
}
