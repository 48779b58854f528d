//! Recovery support - the write-ahead log sink.
//!
//! The buffer pool logs (before-image, after-image) pairs here and forces
//! the log ahead of every page write. Crash recovery replay is out of
//! scope for this crate; the sink's contract is append + force.

mod wal;

pub use wal::{Lsn, WalManager};
