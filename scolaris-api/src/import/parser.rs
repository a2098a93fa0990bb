//! Tabular parser for uploaded notes files
//!
//! The import format is newline-delimited, comma-separated text: a
//! header line naming the columns, then one data line per student.
//! Splitting is deliberately naive — a comma inside a quoted field WILL
//! split the field. The exports this service consumes never quote
//! commas, and general CSV dialect handling is out of scope.

/// One data line, split into cleaned cell values
///
/// `line_number` is the 1-based position in the uploaded file (the
/// header is line 1, so the first data row is line 2), used verbatim in
/// failure reporting.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line_number: usize,
    pub values: Vec<String>,
}

impl RawRow {
    /// Cell value at a resolved column index; empty string when the
    /// line was shorter than the header
    pub fn cell(&self, index: Option<usize>) -> &str {
        index
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Parsed upload: ordered column names plus data rows in file order
#[derive(Debug)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Split uploaded text into a header and data rows
///
/// Lines that are empty after trimming (including a trailing blank
/// line) are discarded before any counting. A file with fewer than two
/// surviving lines has no usable rows and parses to an empty table.
pub fn parse_tabular(content: &str) -> ParsedTable {
    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return ParsedTable {
            headers: Vec::new(),
            rows: Vec::new(),
        };
    }

    let headers = split_line(lines[0]);
    let rows = lines[1..]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut values = split_line(line);
            // Extra fields beyond the header are dropped; short rows
            // read as empty via RawRow::cell
            values.truncate(headers.len());
            RawRow {
                line_number: i + 2,
                values,
            }
        })
        .collect();

    ParsedTable { headers, rows }
}

fn split_line(line: &str) -> Vec<String> {
    line.split(',').map(clean_cell).collect()
}

/// Trim a cell, strip one pair of surrounding double quotes, trim again
fn clean_cell(cell: &str) -> String {
    let trimmed = cell.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}
