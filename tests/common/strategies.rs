use proptest::prelude::*;
use sheet_transfer::types::{CellValue, Row};

/// A single cell, biased toward blanks so cleaning has work to do
pub fn cell_strategy() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        3 => Just(CellValue::Empty),
        1 => Just(CellValue::Text(String::new())),
        4 => "[a-z0-9 ]{1,8}".prop_map(CellValue::Text),
        2 => (-1000i64..1000).prop_map(CellValue::from),
        1 => any::<bool>().prop_map(CellValue::Bool),
    ]
}

/// Ragged rows, blank rows included
pub fn row_strategy() -> impl Strategy<Value = Row> {
    prop::collection::vec(cell_strategy(), 0..5)
}

pub fn rows_strategy(max_rows: usize) -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(row_strategy(), 0..max_rows)
}

/// Source rows for several jobs
pub fn job_sources_strategy(max_jobs: usize, max_rows: usize) -> impl Strategy<Value = Vec<Vec<Row>>> {
    prop::collection::vec(rows_strategy(max_rows), 1..max_jobs)
}
