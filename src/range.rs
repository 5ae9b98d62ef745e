//! # A1 Range Addressing
//!
//! Parsing for sheet-qualified rectangular regions such as `Data!A1:D200`,
//! including open-ended forms (`Data!A:D`, `Data!A2:D`, `Data!3:10`) and quoted
//! sheet names (`'Q1 Sales'!B2`). Rows and columns are exposed zero-based.

use crate::error::{TransferError, TransferResult};
use std::fmt;
use std::str::FromStr;

/// One side of a range. Either coordinate may be absent for open-ended ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: Option<u32>,
    pub row: Option<u32>,
}

/// Parsed range address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetRange {
    sheet: Option<String>,
    start: CellRef,
    end: Option<CellRef>,
}

impl SheetRange {
    pub fn parse(input: &str) -> TransferResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TransferError::invalid_range(input, "range is empty"));
        }

        let (sheet, cells) = match trimmed.rfind('!') {
            Some(idx) => {
                let sheet = parse_sheet_name(input, &trimmed[..idx])?;
                (Some(sheet), &trimmed[idx + 1..])
            }
            None => (None, trimmed),
        };

        if cells.is_empty() {
            return Err(TransferError::invalid_range(input, "missing cell reference"));
        }

        let mut parts = cells.splitn(2, ':');
        let start = parse_cell_ref(input, parts.next().unwrap_or_default())?;
        let end = parts
            .next()
            .map(|part| parse_cell_ref(input, part))
            .transpose()?;

        if let Some(end) = end {
            let column_only = |c: &CellRef| c.row.is_none();
            let row_only = |c: &CellRef| c.column.is_none();
            if (row_only(&start) && column_only(&end)) || (column_only(&start) && row_only(&end)) {
                return Err(TransferError::invalid_range(
                    input,
                    "cannot mix a column-only bound with a row-only bound",
                ));
            }
            if let (Some(a), Some(b)) = (start.column, end.column) {
                if b < a {
                    return Err(TransferError::invalid_range(input, "end column precedes start"));
                }
            }
            if let (Some(a), Some(b)) = (start.row, end.row) {
                if b < a {
                    return Err(TransferError::invalid_range(input, "end row precedes start"));
                }
            }
        } else if start.column.is_none() || start.row.is_none() {
            return Err(TransferError::invalid_range(
                input,
                "a single-cell reference needs both column and row",
            ));
        }

        Ok(Self { sheet, start, end })
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    /// Zero-based first column
    pub fn start_column(&self) -> u32 {
        self.start.column.unwrap_or(0)
    }

    /// Zero-based first row
    pub fn start_row(&self) -> u32 {
        self.start.row.unwrap_or(0)
    }

    /// Zero-based last column, `None` when unbounded
    pub fn end_column(&self) -> Option<u32> {
        match self.end {
            Some(end) => end.column,
            None => self.start.column,
        }
    }

    /// Zero-based last row, `None` when unbounded
    pub fn end_row(&self) -> Option<u32> {
        match self.end {
            Some(end) => end.row,
            None => self.start.row,
        }
    }
}

impl FromStr for SheetRange {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                write!(f, "{sheet}!")?;
            } else {
                write!(f, "'{}'!", sheet.replace('\'', "''"))?;
            }
        }
        write_cell_ref(f, &self.start)?;
        if let Some(end) = &self.end {
            write!(f, ":")?;
            write_cell_ref(f, end)?;
        }
        Ok(())
    }
}

fn write_cell_ref(f: &mut fmt::Formatter<'_>, cell: &CellRef) -> fmt::Result {
    if let Some(column) = cell.column {
        write!(f, "{}", column_to_letters(column))?;
    }
    if let Some(row) = cell.row {
        write!(f, "{}", row + 1)?;
    }
    Ok(())
}

fn parse_sheet_name(input: &str, raw: &str) -> TransferResult<String> {
    if raw.is_empty() {
        return Err(TransferError::invalid_range(input, "empty sheet name"));
    }
    if let Some(quoted) = raw.strip_prefix('\'') {
        let inner = quoted
            .strip_suffix('\'')
            .ok_or_else(|| TransferError::invalid_range(input, "unterminated quoted sheet name"))?;
        if inner.is_empty() {
            return Err(TransferError::invalid_range(input, "empty sheet name"));
        }
        return Ok(inner.replace("''", "'"));
    }
    Ok(raw.to_string())
}

fn parse_cell_ref(input: &str, raw: &str) -> TransferResult<CellRef> {
    let raw = raw.trim().trim_matches('$');
    let split = raw
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(raw.len());
    let (letters, digits) = raw.split_at(split);
    let digits = digits.trim_start_matches('$');

    if letters.is_empty() && digits.is_empty() {
        return Err(TransferError::invalid_range(input, "missing cell reference"));
    }

    let column = if letters.is_empty() {
        None
    } else {
        Some(letters_to_column(letters).ok_or_else(|| {
            TransferError::invalid_range(input, format!("column '{letters}' out of range"))
        })?)
    };

    let row = if digits.is_empty() {
        None
    } else {
        let number: u32 = digits.parse().map_err(|_| {
            TransferError::invalid_range(input, format!("invalid row reference '{digits}'"))
        })?;
        if number == 0 {
            return Err(TransferError::invalid_range(input, "rows are numbered from 1"));
        }
        Some(number - 1)
    };

    Ok(CellRef { column, row })
}

/// `A` → 0, `Z` → 25, `AA` → 26
pub fn letters_to_column(letters: &str) -> Option<u32> {
    let mut value: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    value.checked_sub(1)
}

/// 0 → `A`, 25 → `Z`, 26 → `AA`
pub fn column_to_letters(column: u32) -> String {
    let mut n = column as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
