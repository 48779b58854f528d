//! Heap file - a table's on-disk backing store.
//!
//! # File Layout
//! A table is a single flat file of fixed-size pages laid out sequentially:
//! ```text
//! ┌─────────┬─────────┬─────────┬─────────┐
//! │ Page 0  │ Page 1  │  ...    │ Page N  │
//! └─────────┴─────────┴─────────┴─────────┘
//! Offset:  0   page_size  ...   N×page_size
//! ```
//! Page `n` is located at byte offset `n × page_size`, and the file length
//! is always an exact multiple of the page size — a partial trailing page
//! is corruption, not rounding.
//!
//! # Concurrency
//! Raw reads and writes are serialized by an internal file mutex. Growing
//! the file is additionally serialized by a dedicated allocation lock,
//! distinct from per-page locks: two inserters that both observed "no page
//! has room" must not both append and orphan a page. `insert_tuple` and
//! `delete_tuple` never touch the file directly — they go through the
//! buffer pool for every page so that locking and dirty tracking apply.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::{BufferPool, PageRef};
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result, TransactionId};
use crate::concurrency::LockMode;
use crate::storage::heap_page::HeapPage;
use crate::storage::tuple::{Schema, Tuple};

/// A table's page store.
pub struct HeapFile {
    table_id: u32,
    schema: Schema,
    page_size: usize,
    file: Mutex<File>,
    /// Serializes file growth; held only for the duration of an append.
    alloc_lock: Mutex<()>,
}

impl HeapFile {
    /// Create a new, empty heap file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, table_id: u32, schema: Schema) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        Ok(Self::from_file(file, table_id, schema, PAGE_SIZE))
    }

    /// Open an existing heap file.
    pub fn open<P: AsRef<Path>>(path: P, table_id: u32, schema: Schema) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::from_file(file, table_id, schema, PAGE_SIZE))
    }

    /// Open an existing heap file, or create it if missing.
    pub fn open_or_create<P: AsRef<Path>>(path: P, table_id: u32, schema: Schema) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, table_id, schema)
        } else {
            Self::create(path, table_id, schema)
        }
    }

    /// Like [`HeapFile::open_or_create`] with an explicit page size.
    ///
    /// Intended for test harnesses that want tiny pages; production code
    /// uses the default [`PAGE_SIZE`]. The size is fixed for the lifetime
    /// of the file object.
    pub fn with_page_size<P: AsRef<Path>>(
        path: P,
        table_id: u32,
        schema: Schema,
        page_size: usize,
    ) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self::from_file(file, table_id, schema, page_size))
    }

    fn from_file(file: File, table_id: u32, schema: Schema, page_size: usize) -> Self {
        HeapFile {
            table_id,
            schema,
            page_size,
            file: Mutex::new(file),
            alloc_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ========================================================================
    // Raw page I/O
    // ========================================================================

    /// Number of pages in the file.
    ///
    /// # Errors
    /// `Error::Corruption` if the file length is not an exact multiple of
    /// the page size.
    pub fn page_count(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        if len % self.page_size as u64 != 0 {
            return Err(Error::Corruption(format!(
                "table {} file length {} is not a multiple of page size {}",
                self.table_id, len, self.page_size
            )));
        }
        Ok((len / self.page_size as u64) as u32)
    }

    /// Read page `page_no` from disk.
    pub fn read_page(&self, page_no: u32) -> Result<HeapPage> {
        if page_no >= self.page_count()? {
            return Err(Error::PageNotFound(PageId::new(self.table_id, page_no)));
        }

        let mut buf = vec![0u8; self.page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(page_no as u64 * self.page_size as u64))?;
            file.read_exact(&mut buf)?;
        }
        HeapPage::from_bytes(
            PageId::new(self.table_id, page_no),
            &buf,
            self.schema.clone(),
        )
    }

    /// Write a page image back to its slot in the file.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        self.write_page_bytes(page.pid().page_no, &page.to_bytes())
    }

    /// Write pre-serialized page bytes. Used by the buffer pool's flush
    /// path, which has already serialized the page for the log record.
    pub(crate) fn write_page_bytes(&self, page_no: u32, bytes: &[u8]) -> Result<()> {
        if page_no >= self.page_count()? {
            return Err(Error::PageNotFound(PageId::new(self.table_id, page_no)));
        }
        debug_assert_eq!(bytes.len(), self.page_size);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_no as u64 * self.page_size as u64))?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }

    /// Extend the file by exactly one zeroed page, written straight to the
    /// medium so any reader immediately sees a well-formed page there.
    ///
    /// The append is serialized by the allocation lock; per-page locks do
    /// not protect a page that does not exist yet.
    pub fn append_empty_page(&self) -> Result<PageId> {
        let _alloc = self.alloc_lock.lock();

        let page_no = self.page_count()?;
        let zeros = HeapPage::empty_bytes(self.page_size);
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(page_no as u64 * self.page_size as u64))?;
            file.write_all(&zeros)?;
            file.sync_all()?;
        }
        Ok(PageId::new(self.table_id, page_no))
    }

    // ========================================================================
    // Tuple operations (through the buffer pool)
    // ========================================================================

    /// Insert a tuple into the first page with a free slot, appending a new
    /// page if every existing one is full. Returns the pages mutated, for
    /// the buffer pool to mark dirty.
    ///
    /// Every page is opened through the buffer pool with an exclusive lock,
    /// so the scan itself participates in two-phase locking.
    pub fn insert_tuple(
        &self,
        tx: TransactionId,
        tuple: Tuple,
        pool: &BufferPool,
    ) -> Result<Vec<PageId>> {
        if !tuple.matches(&self.schema) {
            return Err(Error::SchemaMismatch);
        }

        for page_no in 0..self.page_count()? {
            let pid = PageId::new(self.table_id, page_no);
            let page = pool.get_page(tx, pid, LockMode::Exclusive)?;
            let mut guard = page.write();
            if guard.empty_slots() > 0 {
                guard.insert(tuple)?;
                // Dirty-mark while still inside the write guard, so the
                // eviction step can never observe the mutation as clean.
                guard.mark_dirty(tx);
                return Ok(vec![pid]);
            }
        }

        // No existing page has room: grow the file and insert there.
        let pid = self.append_empty_page()?;
        let page = pool.get_page(tx, pid, LockMode::Exclusive)?;
        {
            let mut guard = page.write();
            guard.insert(tuple)?;
            guard.mark_dirty(tx);
        }
        Ok(vec![pid])
    }

    /// Delete a tuple at its stored location. Returns the page mutated.
    pub fn delete_tuple(
        &self,
        tx: TransactionId,
        tuple: &Tuple,
        pool: &BufferPool,
    ) -> Result<Vec<PageId>> {
        let rid = tuple.record_id().ok_or_else(|| {
            Error::InvariantViolation("deleting a tuple with no stored location".into())
        })?;
        if rid.page.table != self.table_id {
            return Err(Error::InvariantViolation(format!(
                "tuple of table {} deleted through table {}",
                rid.page.table, self.table_id
            )));
        }

        let page = pool.get_page(tx, rid.page, LockMode::Exclusive)?;
        {
            let mut guard = page.write();
            guard.remove(rid)?;
            guard.mark_dirty(tx);
        }
        Ok(vec![rid.page])
    }
}

/// A page-at-a-time tuple scan over a heap file.
///
/// Each page is fetched through the buffer pool with a shared lock, so a
/// scan participates in two-phase locking like any other reader. Tuples of
/// the current page are buffered; the underlying page handle is released
/// between pages (the lock, per strict 2PL, is not).
pub struct HeapFileIterator {
    pool: Arc<BufferPool>,
    tx: TransactionId,
    table_id: u32,
    page_count: u32,
    page_no: u32,
    current: std::vec::IntoIter<Tuple>,
}

impl HeapFileIterator {
    /// Start a scan of `table_id` on behalf of `tx`.
    pub fn new(pool: Arc<BufferPool>, tx: TransactionId, table_id: u32) -> Result<Self> {
        let page_count = pool.catalog().file(table_id)?.page_count()?;
        Ok(HeapFileIterator {
            pool,
            tx,
            table_id,
            page_count,
            page_no: 0,
            current: Vec::new().into_iter(),
        })
    }

    /// The next tuple, or `None` when the scan is exhausted.
    pub fn next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if let Some(tuple) = self.current.next() {
                return Ok(Some(tuple));
            }
            if self.page_no >= self.page_count {
                return Ok(None);
            }
            let pid = PageId::new(self.table_id, self.page_no);
            self.page_no += 1;

            let page: PageRef = self.pool.get_page(self.tx, pid, LockMode::Shared)?;
            let tuples: Vec<Tuple> = page.read().tuples().cloned().collect();
            self.current = tuples.into_iter();
        }
    }

    /// Restart the scan from the first page.
    pub fn rewind(&mut self) -> Result<()> {
        self.page_no = 0;
        self.current = Vec::new().into_iter();
        Ok(())
    }
}
