//! Viewer-side handling of generated report files.
//!
//! Generated files come in two kinds: tabular (comma-delimited with a header
//! row) and plain text. A parse failure is scoped to the one file being
//! viewed and never invalidates the rest of the report.

use thiserror::Error;

/// Supported content kinds in the file viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Tabular,
    Plain,
}

/// Kind is decided by suffix alone: `.csv` is tabular, everything else is
/// rendered verbatim.
pub fn file_kind(name: &str) -> FileKind {
    if name.to_ascii_lowercase().ends_with(".csv") {
        FileKind::Tabular
    } else {
        FileKind::Plain
    }
}

/// Directory identifier for the file-fetch endpoint: the last path segment
/// of a run's output location. Opaque to the console; percent-encoded on use.
pub fn results_directory(output_location: &str) -> &str {
    output_location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(output_location)
}

/// Parsed tabular content: header columns plus one cell row per data line,
/// each normalized to the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Cell addressed by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableParseError {
    #[error("file has no header row")]
    MissingHeader,
}

/// Parse comma-delimited content with a header row.
///
/// Empty lines are ignored. Zero data rows is a valid outcome, distinct from
/// a parse error. Rows shorter than the header are padded with empty cells;
/// longer rows are truncated to the header width.
pub fn parse_table(content: &str) -> Result<TableData, TableParseError> {
    let mut lines = content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.is_empty());

    let header = lines.next().ok_or(TableParseError::MissingHeader)?;
    let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();

    let rows = lines
        .map(|line| {
            let mut cells: Vec<String> = line.split(',').map(|c| c.to_string()).collect();
            cells.resize(columns.len(), String::new());
            cells
        })
        .collect();

    Ok(TableData { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_header_and_rows() {
        let t = parse_table("a,b\n1,2\n3,4\n").unwrap();
        assert_eq!(t.columns, vec!["a", "b"]);
        assert_eq!(
            t.rows,
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string(), "4".to_string()],
            ]
        );
        assert_eq!(t.cell(0, "a"), Some("1"));
        assert_eq!(t.cell(1, "b"), Some("4"));
    }

    #[test]
    fn header_only_parses_to_zero_rows() {
        let t = parse_table("a,b\n").unwrap();
        assert_eq!(t.columns, vec!["a", "b"]);
        assert!(t.rows.is_empty());
    }

    #[test]
    fn empty_content_is_a_parse_error() {
        assert_eq!(parse_table(""), Err(TableParseError::MissingHeader));
        assert_eq!(parse_table("\n\n"), Err(TableParseError::MissingHeader));
    }

    #[test]
    fn empty_lines_are_ignored() {
        let t = parse_table("a,b\n\n1,2\n\n").unwrap();
        assert_eq!(t.rows.len(), 1);
    }

    #[test]
    fn crlf_content_parses_cleanly() {
        let t = parse_table("a,b\r\n1,2\r\n").unwrap();
        assert_eq!(t.columns, vec!["a", "b"]);
        assert_eq!(t.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn ragged_rows_are_normalized_to_header_width() {
        let t = parse_table("a,b,c\n1,2\n1,2,3,4\n").unwrap();
        assert_eq!(t.rows[0], vec!["1", "2", ""]);
        assert_eq!(t.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn kind_is_decided_by_suffix() {
        assert_eq!(file_kind("metrics_user.csv"), FileKind::Tabular);
        assert_eq!(file_kind("METRICS.CSV"), FileKind::Tabular);
        assert_eq!(file_kind("list_ips.txt"), FileKind::Plain);
        assert_eq!(file_kind("notes.md"), FileKind::Plain);
    }

    #[test]
    fn directory_is_last_segment_of_output_location() {
        assert_eq!(
            results_directory("/data/results/sec.evtx-takajo-analysis"),
            "sec.evtx-takajo-analysis"
        );
        assert_eq!(results_directory("/data/results/run/"), "run");
        assert_eq!(results_directory("plain-name"), "plain-name");
    }
}
