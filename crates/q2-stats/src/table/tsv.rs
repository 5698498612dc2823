//! Tab-separated tables with a single header row.

use crate::error::{Result, StatsError};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TsvTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
    }
}

pub fn read<R: BufRead>(reader: R) -> Result<TsvTable> {
    let mut columns: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<String> = line.split('\t').map(|c| c.trim().to_string()).collect();

        match &columns {
            None => columns = Some(cells),
            Some(header) => {
                if cells.len() != header.len() {
                    return Err(StatsError::TableParse {
                        format: "TSV",
                        line: idx + 1,
                        message: format!("expected {} cells, found {}", header.len(), cells.len()),
                    });
                }
                rows.push(cells);
            }
        }
    }

    let columns = columns.ok_or_else(|| StatsError::TableParse {
        format: "TSV",
        line: 1,
        message: "missing header row".to_string(),
    })?;
    Ok(TsvTable { columns, rows })
}

pub fn write<W: Write>(writer: &mut W, columns: &[&str], rows: &[Vec<String>]) -> Result<()> {
    writeln!(writer, "{}", columns.join("\t"))?;
    for row in rows {
        writeln!(writer, "{}", row.join("\t"))?;
    }
    writer.flush()?;
    Ok(())
}
