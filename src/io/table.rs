//! Precomputed similarity matrices.
//!
//! One row per item of sequence 1, with whitespace separated similarities for each item of
//! sequence 2. Empty lines and lines starting with `#` are ignored. `NA` marks a pair that
//! could not be scored.

use std::io::BufRead;
use std::path::Path;

use crate::errors::VqalignError;
use crate::io::open_reader;
use crate::scorer::TableScorer;

pub fn parse_table<R: BufRead>(reader: R) -> Result<TableScorer, VqalignError> {
    let mut rows = Vec::new();
    let mut num_columns = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = trimmed.split_whitespace()
            .map(|field| parse_value(field)
                .map_err(|reason| VqalignError::InvalidTable { line: line_no, reason }))
            .collect::<Result<Vec<_>, _>>()?;

        match num_columns {
            None => num_columns = Some(row.len()),
            Some(n) if n != row.len() => return Err(VqalignError::InvalidTable {
                line: line_no,
                reason: format!("expected {n} columns, found {}", row.len()),
            }),
            _ => (),
        }

        rows.push(row);
    }

    TableScorer::with_missing(rows)
}

fn parse_value(field: &str) -> Result<Option<f64>, String> {
    if field.eq_ignore_ascii_case("na") {
        return Ok(None);
    }

    field.parse::<f64>()
        .map(Some)
        .map_err(|e| format!("could not parse '{field}': {e}"))
}

pub fn load_table(path: &Path) -> Result<TableScorer, VqalignError> {
    let reader = open_reader(path)
        .map_err(|source| VqalignError::SequenceLoad {
            path: path.to_path_buf(),
            source,
        })?;

    parse_table(reader)
}
