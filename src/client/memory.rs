//! In-memory [`RemoteTableClient`] backed by per-sheet cell grids.
//!
//! Mirrors the observable semantics the pipeline depends on: reads trim
//! trailing blanks, updates overwrite from the range anchor, appends land after
//! the last non-empty row in the range's columns, clears blank a region.
//! Useful for dry runs and tests.

use super::{RemoteResult, RemoteTableClient};
use crate::error::RemoteError;
use crate::range::SheetRange;
use crate::types::{CellValue, Row};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

const DEFAULT_SHEET: &str = "Sheet1";

type Grid = Vec<Row>;

/// Bounds of a region, zero-based and inclusive; `None` means unbounded
#[derive(Debug, Clone, Copy)]
struct Region {
    first_row: usize,
    last_row: Option<usize>,
    first_col: usize,
    last_col: Option<usize>,
}

impl Region {
    fn from_range(range: &SheetRange) -> Self {
        Self {
            first_row: range.start_row() as usize,
            last_row: range.end_row().map(|r| r as usize),
            first_col: range.start_column() as usize,
            last_col: range.end_column().map(|c| c as usize),
        }
    }

    fn row_limit(&self, len: usize) -> usize {
        match self.last_row {
            Some(last) => (last + 1).min(len),
            None => len,
        }
    }

    fn col_limit(&self, len: usize) -> usize {
        match self.last_col {
            Some(last) => (last + 1).min(len),
            None => len,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTableClient {
    /// table id -> sheet name -> grid
    tables: RwLock<HashMap<String, HashMap<String, Grid>>>,
}

impl InMemoryTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty table so reads against it succeed
    pub fn create_table(&self, table_id: &str) {
        self.tables
            .write()
            .entry(table_id.to_string())
            .or_default();
    }

    /// Synchronously place rows at `range`, creating the table if needed
    pub fn seed(&self, table_id: &str, range: &str, rows: &[Row]) -> RemoteResult<()> {
        let parsed = parse(range)?;
        let mut tables = self.tables.write();
        let grid = sheet_mut(&mut tables, table_id, &parsed);
        write_at(grid, Region::from_range(&parsed).first_row, &parsed, rows);
        Ok(())
    }

    /// Synchronous read with the same semantics as [`RemoteTableClient::get`]
    pub fn read(&self, table_id: &str, range: &str) -> RemoteResult<Vec<Row>> {
        let parsed = parse(range)?;
        let tables = self.tables.read();
        let sheets = tables
            .get(table_id)
            .ok_or_else(|| RemoteError::permanent(format!("table '{table_id}' not found")))?;
        let Some(grid) = sheets.get(sheet_name(&parsed)) else {
            return Ok(Vec::new());
        };

        let region = Region::from_range(&parsed);
        let mut rows: Vec<Row> = (region.first_row..region.row_limit(grid.len()))
            .map(|r| {
                let source = &grid[r];
                let end = region.col_limit(source.len());
                let mut cells: Row = if region.first_col < end {
                    source[region.first_col..end].to_vec()
                } else {
                    Vec::new()
                };
                while cells.last().is_some_and(CellValue::is_empty) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }
}

#[async_trait]
impl RemoteTableClient for InMemoryTableClient {
    async fn get(&self, table_id: &str, range: &str) -> RemoteResult<Vec<Row>> {
        self.read(table_id, range)
    }

    async fn update(&self, table_id: &str, range: &str, rows: &[Row]) -> RemoteResult<()> {
        self.seed(table_id, range, rows)
    }

    async fn append(&self, table_id: &str, range: &str, rows: &[Row]) -> RemoteResult<()> {
        let parsed = parse(range)?;
        let region = Region::from_range(&parsed);
        let mut tables = self.tables.write();
        let grid = sheet_mut(&mut tables, table_id, &parsed);

        let last_filled = (region.first_row..region.row_limit(grid.len()))
            .rev()
            .find(|&r| {
                let row = &grid[r];
                let end = region.col_limit(row.len());
                region.first_col < end
                    && row[region.first_col..end].iter().any(|c| !c.is_empty())
            });
        let insert_at = last_filled.map_or(region.first_row, |r| r + 1);

        write_at(grid, insert_at, &parsed, rows);
        Ok(())
    }

    async fn clear(&self, table_id: &str, range: &str) -> RemoteResult<()> {
        let parsed = parse(range)?;
        let region = Region::from_range(&parsed);
        let mut tables = self.tables.write();
        let grid = sheet_mut(&mut tables, table_id, &parsed);

        let row_end = region.row_limit(grid.len());
        for row in grid.iter_mut().take(row_end).skip(region.first_row) {
            let col_end = region.col_limit(row.len());
            for cell in row.iter_mut().take(col_end).skip(region.first_col) {
                *cell = CellValue::Empty;
            }
        }
        Ok(())
    }
}

fn parse(range: &str) -> RemoteResult<SheetRange> {
    SheetRange::parse(range).map_err(|e| RemoteError::permanent(e.to_string()))
}

fn sheet_name(range: &SheetRange) -> &str {
    range.sheet().unwrap_or(DEFAULT_SHEET)
}

fn sheet_mut<'a>(
    tables: &'a mut HashMap<String, HashMap<String, Grid>>,
    table_id: &str,
    range: &SheetRange,
) -> &'a mut Grid {
    tables
        .entry(table_id.to_string())
        .or_default()
        .entry(sheet_name(range).to_string())
        .or_default()
}

fn write_at(grid: &mut Grid, first_row: usize, range: &SheetRange, rows: &[Row]) {
    let first_col = range.start_column() as usize;
    for (offset, source) in rows.iter().enumerate() {
        let r = first_row + offset;
        if grid.len() <= r {
            grid.resize_with(r + 1, Vec::new);
        }
        let target = &mut grid[r];
        let needed = first_col + source.len();
        if target.len() < needed {
            target.resize(needed, CellValue::Empty);
        }
        for (c, cell) in source.iter().enumerate() {
            target[first_col + c] = cell.clone();
        }
    }
}
