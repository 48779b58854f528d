//! Write-ahead log sink.
//!
//! The buffer pool calls into this sink at exactly one point: flushing a
//! dirty page. The update record carrying the page's before- and
//! after-image is appended and the log is forced *before* the page bytes
//! reach the table file, so recovery always has the images it needs to
//! undo or redo the write. Replay itself is a recovery-manager concern and
//! lives outside this crate's scope.
//!
//! # Record framing
//! ```text
//! ┌───────────┬────────┬────────┬─────────┬──────────┬────────┬─────────┬───────┐
//! │ total_len │ tx     │ table  │ page_no │ before.. │ a_len  │ after.. │ crc32 │
//! │ u32       │ u64    │ u32    │ u32     │ u32+data │ u32    │ data    │ u32   │
//! └───────────┴────────┴────────┴─────────┴──────────┴────────┴─────────┴───────┘
//! ```
//! All integers little-endian. The checksum covers everything between
//! `total_len` and itself, so a torn append is detectable on scan.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::common::{PageId, Result, TransactionId};

/// Log sequence number: byte offset of a record in the log file.
pub type Lsn = u64;

/// Append-only log file with explicit force.
pub struct WalManager {
    writer: Mutex<BufWriter<File>>,
    next_lsn: AtomicU64,
}

impl WalManager {
    /// Open (or create) the log file at `path`, appending to any existing
    /// records.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(path)?;
        let next_lsn = AtomicU64::new(file.metadata()?.len());

        Ok(WalManager {
            writer: Mutex::new(BufWriter::new(file)),
            next_lsn,
        })
    }

    /// Append an update record for a page flush on behalf of `tx`.
    ///
    /// Returns the record's LSN. The record is buffered; call
    /// [`WalManager::force`] before writing the page itself.
    pub fn log_update(
        &self,
        tx: TransactionId,
        pid: PageId,
        before: &[u8],
        after: &[u8],
    ) -> Result<Lsn> {
        let mut payload = Vec::with_capacity(24 + before.len() + after.len());
        payload.extend_from_slice(&tx.value().to_le_bytes());
        payload.extend_from_slice(&pid.table.to_le_bytes());
        payload.extend_from_slice(&pid.page_no.to_le_bytes());
        payload.extend_from_slice(&(before.len() as u32).to_le_bytes());
        payload.extend_from_slice(before);
        payload.extend_from_slice(&(after.len() as u32).to_le_bytes());
        payload.extend_from_slice(after);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&payload);
        let crc = hasher.finalize();

        // total_len counts everything after the length field itself.
        let total_len = (payload.len() + 4) as u32;

        let mut writer = self.writer.lock();
        let lsn = self
            .next_lsn
            .fetch_add(4 + total_len as u64, Ordering::SeqCst);
        writer.write_all(&total_len.to_le_bytes())?;
        writer.write_all(&payload)?;
        writer.write_all(&crc.to_le_bytes())?;
        Ok(lsn)
    }

    /// Force all buffered records to durable storage.
    pub fn force(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Byte offset the next record will be appended at. Advances exactly
    /// when a record is logged, which makes it a cheap "did anything get
    /// logged" probe.
    pub fn next_lsn(&self) -> Lsn {
        self.next_lsn.load(Ordering::SeqCst)
    }
}
