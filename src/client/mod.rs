//! # Remote Table Client
//!
//! The capability boundary between the pipeline and whatever spreadsheet-like
//! service holds the data. The pipeline only ever needs four operations, each
//! addressing a table by opaque id and a region in A1 notation.
//!
//! Implementations classify their own failures through [`RemoteError::kind`];
//! the retry layer decides what to do with that classification.

pub mod memory;

use crate::error::RemoteError;
use crate::types::Row;
use async_trait::async_trait;

pub use memory::InMemoryTableClient;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[async_trait]
pub trait RemoteTableClient: Send + Sync {
    /// Read the cell values of `range`
    async fn get(&self, table_id: &str, range: &str) -> RemoteResult<Vec<Row>>;

    /// Overwrite cells starting at the top-left of `range`
    async fn update(&self, table_id: &str, range: &str, rows: &[Row]) -> RemoteResult<()>;

    /// Add rows after the last non-empty row found within `range`
    async fn append(&self, table_id: &str, range: &str, rows: &[Row]) -> RemoteResult<()>;

    /// Blank every cell of `range`
    async fn clear(&self, table_id: &str, range: &str) -> RemoteResult<()>;
}
