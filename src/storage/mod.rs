//! Storage layer - heap files, pages, tuples, and the table directory.
//!
//! - [`HeapFile`] - a table's flat file of fixed-size pages
//! - [`HeapPage`] - the slotted page format
//! - [`tuple`] - field values and record layout
//! - [`Catalog`] - table id → heap file directory

mod catalog;
mod heap_file;
mod heap_page;
pub mod tuple;

pub use catalog::Catalog;
pub use heap_file::{HeapFile, HeapFileIterator};
pub use heap_page::HeapPage;
pub use tuple::{Field, FieldType, RecordId, Schema, Tuple};
