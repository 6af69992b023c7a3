//! Sheet contents as headerless CSV: one record per grid row, one field per
//! column. Blank fields are empty cells.

use crate::domain::cell::CellValue;
use crate::domain::error::SheetError;
use crate::domain::grid::Grid;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A non-empty cell read from a sheet file.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEntry {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
}

fn csv_error(e: csv::Error) -> SheetError {
    SheetError::Io(e.into())
}

pub fn read_cells<R: Read>(reader: R) -> Result<Vec<CellEntry>, SheetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_error)?;
        for (col, field) in record.iter().enumerate() {
            let value = CellValue::from_input(field);
            if !value.is_empty() {
                entries.push(CellEntry { row, col, value });
            }
        }
    }
    Ok(entries)
}

pub fn load_cells(path: &Path) -> Result<Vec<CellEntry>, SheetError> {
    read_cells(File::open(path)?)
}

/// Bottom-right corner (exclusive) of the non-empty region.
fn used_extent(grid: &Grid) -> (usize, usize) {
    let mut rows = 0;
    let mut cols = 0;
    for (r, row) in grid.iter_rows().enumerate() {
        if let Some(last) = row.iter().rposition(|c| !c.value.is_empty()) {
            rows = r + 1;
            cols = cols.max(last + 1);
        }
    }
    (rows, cols)
}

/// Write the used region of `grid`, anchored at (0, 0).
pub fn write_grid<W: Write>(grid: &Grid, writer: W) -> Result<(), SheetError> {
    let (rows, cols) = used_extent(grid);
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for r in 0..rows {
        wtr.write_record((0..cols).map(|c| grid.get(r, c).to_string()))
            .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_grid(grid: &Grid, path: &Path) -> Result<(), SheetError> {
    write_grid(grid, File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::GridDimensions;
    use tempfile::TempDir;

    #[test]
    fn read_skips_blank_fields() {
        let entries = read_cells("\"=PRICES(ASX,BHP,1Y)\",,note\n,,\n,42\n".as_bytes()).unwrap();
        assert_eq!(
            entries,
            vec![
                CellEntry {
                    row: 0,
                    col: 0,
                    value: CellValue::text("=PRICES(ASX,BHP,1Y)")
                },
                CellEntry {
                    row: 0,
                    col: 2,
                    value: CellValue::text("note")
                },
                CellEntry {
                    row: 2,
                    col: 1,
                    value: CellValue::Number(42.0)
                },
            ]
        );
    }

    #[test]
    fn quoted_formula_with_commas() {
        let entries = read_cells("\"=PRICES(ASX,BHP)\"\n".as_bytes()).unwrap();
        assert_eq!(entries[0].value, CellValue::text("=PRICES(ASX,BHP)"));
    }

    #[test]
    fn float_words_round_trip_as_text() {
        let entries = read_cells("INF,NaN,Infinity\n".as_bytes()).unwrap();
        assert!(entries.iter().all(|e| matches!(e.value, CellValue::Text(_))));

        let mut grid = Grid::new(GridDimensions { rows: 2, cols: 3 });
        for entry in entries {
            grid.set(entry.row, entry.col, entry.value).unwrap();
        }
        let mut out = Vec::new();
        write_grid(&grid, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "INF,NaN,Infinity\n");
    }

    #[test]
    fn write_trims_to_used_region() {
        let mut grid = Grid::new(GridDimensions { rows: 10, cols: 10 });
        grid.set(0, 0, CellValue::text("Date")).unwrap();
        grid.set(1, 2, CellValue::Number(1.5)).unwrap();

        let mut out = Vec::new();
        write_grid(&grid, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Date,,\n,,1.5\n");
    }

    #[test]
    fn empty_grid_writes_nothing() {
        let grid = Grid::default();
        let mut out = Vec::new();
        write_grid(&grid, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.csv");
        let mut grid = Grid::default();
        grid.set(3, 1, CellValue::text("=PRICES(NYSE,IBM,6M)")).unwrap();
        save_grid(&grid, &path).unwrap();

        let entries = load_cells(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!((entries[0].row, entries[0].col), (3, 1));
    }

    #[test]
    fn load_missing_file_is_io() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_cells(&dir.path().join("nope.csv")),
            Err(SheetError::Io(_))
        ));
    }
}
