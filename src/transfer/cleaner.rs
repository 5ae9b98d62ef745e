//! Row normalization.
//!
//! Cleaning drops rows with no content at all and fills the holes of the
//! remaining rows with a sentinel, so the destination never receives blank
//! cells. Pure and order-preserving.

use crate::types::{is_blank_row, CellValue, Row};

#[derive(Debug, Clone, PartialEq)]
pub struct DataCleaner {
    sentinel: CellValue,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl DataCleaner {
    pub fn new(sentinel: f64) -> Self {
        Self {
            sentinel: CellValue::Number(sentinel),
        }
    }

    pub fn sentinel(&self) -> &CellValue {
        &self.sentinel
    }

    pub fn clean(&self, rows: Vec<Row>) -> Vec<Row> {
        rows.into_iter()
            .filter(|row| !is_blank_row(row))
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            self.sentinel.clone()
                        } else {
                            cell
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Clean with the default numeric-zero sentinel
pub fn clean(rows: Vec<Row>) -> Vec<Row> {
    DataCleaner::default().clean(rows)
}

/// Pad every row with empty cells up to the widest row's width
pub fn pad_to_width(rows: &mut [Row]) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, CellValue::Empty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::row;
    use proptest::prelude::*;

    #[test]
    fn test_drops_blank_rows_and_fills_holes() {
        let rows = vec![
            vec![CellValue::from("a"), CellValue::Empty, CellValue::from("")],
            vec![CellValue::Empty, CellValue::from("")],
            vec![],
            vec![CellValue::from(3.5), CellValue::from(false)],
        ];

        let cleaned = clean(rows);
        assert_eq!(
            cleaned,
            vec![
                vec![CellValue::from("a"), CellValue::from(0.0), CellValue::from(0.0)],
                vec![CellValue::from(3.5), CellValue::from(false)],
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(clean(Vec::new()).is_empty());
    }

    #[test]
    fn test_custom_sentinel() {
        let cleaner = DataCleaner::new(-1.0);
        let cleaned = cleaner.clean(vec![vec![CellValue::Empty, CellValue::from("x")]]);
        assert_eq!(cleaned, vec![vec![CellValue::from(-1.0), CellValue::from("x")]]);
    }

    #[test]
    fn test_pad_to_width() {
        let mut rows = vec![row(["a"]), row(["b", "c", "d"]), vec![]];
        pad_to_width(&mut rows);
        assert!(rows.iter().all(|r| r.len() == 3));
        assert_eq!(rows[0][2], CellValue::Empty);
    }

    fn cell_strategy() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            Just(CellValue::Empty),
            Just(CellValue::Text(String::new())),
            "[a-z ]{1,6}".prop_map(CellValue::Text),
            (-1000i64..1000).prop_map(CellValue::from),
            any::<bool>().prop_map(CellValue::Bool),
        ]
    }

    fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::vec(prop::collection::vec(cell_strategy(), 0..6), 0..20)
    }

    proptest! {
        /// Property: cleaning twice is the same as cleaning once
        #[test]
        fn clean_is_idempotent(rows in rows_strategy()) {
            let once = clean(rows);
            let twice = clean(once.clone());
            prop_assert_eq!(once, twice);
        }

        /// Property: output never holds blank cells or originally-blank rows
        #[test]
        fn clean_output_has_no_blanks(rows in rows_strategy()) {
            let non_blank = rows.iter().filter(|r| !is_blank_row(r)).count();
            let cleaned = clean(rows);
            prop_assert_eq!(cleaned.len(), non_blank);
            prop_assert!(cleaned.iter().all(|r| r.iter().all(|c| !c.is_empty())));
        }
    }
}
