//! Heap page - the slotted page format for table data.
//!
//! # Page Layout
//! ```text
//! ┌────────────────┬─────────┬─────────┬─────────┬──────────┐
//! │ slot bitmap    │ slot 0  │ slot 1  │  ...    │ padding  │
//! │ ceil(slots/8)B │ tuple B │ tuple B │         │          │
//! └────────────────┴─────────┴─────────┴─────────┴──────────┘
//! ```
//!
//! Tuples are fixed-size, so the slot count is determined by the page size
//! and the table's record layout:
//!
//! `slots = floor(page_size * 8 / (tuple_bytes * 8 + 1))`
//!
//! (each slot costs its tuple bytes plus one bitmap bit). A slot whose
//! bitmap bit is clear contains undefined bytes and is free for reuse.
//!
//! Besides the stored bytes, an in-memory page carries the two pieces of
//! bookkeeping the buffer pool's transaction semantics rest on:
//! - the **dirty marker**: `None` when clean, or the transaction that
//!   currently owns an unflushed mutation;
//! - the **before-image**: a byte snapshot of the page as of the last
//!   moment it was known clean, logged alongside the after-image when the
//!   page is flushed. It is refreshed explicitly, never automatically.

use crate::common::{Error, PageId, Result, TransactionId};
use crate::storage::tuple::{RecordId, Schema, Tuple};

/// An in-memory heap page.
#[derive(Debug)]
pub struct HeapPage {
    pid: PageId,
    schema: Schema,
    page_size: usize,
    /// Decoded slot-occupancy bitmap, one flag per slot.
    used: Vec<bool>,
    /// Tuple per slot; `None` where the slot is free.
    tuples: Vec<Option<Tuple>>,
    /// Transaction owning an unflushed mutation, or `None` when clean.
    dirtier: Option<TransactionId>,
    /// Byte snapshot from the last clean point, for recovery logging.
    before_image: Vec<u8>,
}

impl HeapPage {
    /// Number of tuple slots a page of `page_size` bytes holds for `schema`.
    pub fn slot_count(schema: &Schema, page_size: usize) -> usize {
        (page_size * 8) / (schema.tuple_bytes() * 8 + 1)
    }

    /// Bytes occupied by the slot bitmap.
    fn bitmap_bytes(schema: &Schema, page_size: usize) -> usize {
        Self::slot_count(schema, page_size).div_ceil(8)
    }

    /// A well-formed, all-slots-free page image.
    pub fn empty_bytes(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// Decode a page from its on-disk bytes.
    ///
    /// The freshly decoded page is clean, and its before-image is the bytes
    /// it was decoded from.
    pub fn from_bytes(pid: PageId, bytes: &[u8], schema: Schema) -> Result<Self> {
        let page_size = bytes.len();
        let slots = Self::slot_count(&schema, page_size);
        let bitmap_len = Self::bitmap_bytes(&schema, page_size);
        let tuple_len = schema.tuple_bytes();

        let mut used = Vec::with_capacity(slots);
        let mut tuples = Vec::with_capacity(slots);
        for slot in 0..slots {
            let occupied = bytes[slot / 8] & (1 << (slot % 8)) != 0;
            used.push(occupied);
            if occupied {
                let off = bitmap_len + slot * tuple_len;
                let mut tuple = Tuple::read_from(&schema, &bytes[off..off + tuple_len])?;
                tuple.set_record_id(Some(RecordId { page: pid, slot }));
                tuples.push(Some(tuple));
            } else {
                tuples.push(None);
            }
        }

        Ok(HeapPage {
            pid,
            schema,
            page_size,
            used,
            tuples,
            dirtier: None,
            before_image: bytes.to_vec(),
        })
    }

    /// Encode this page back into its on-disk representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let bitmap_len = Self::bitmap_bytes(&self.schema, self.page_size);
        let tuple_len = self.schema.tuple_bytes();
        let mut bytes = vec![0u8; self.page_size];

        for (slot, tuple) in self.tuples.iter().enumerate() {
            if let Some(tuple) = tuple {
                bytes[slot / 8] |= 1 << (slot % 8);
                let off = bitmap_len + slot * tuple_len;
                tuple.write_to(&self.schema, &mut bytes[off..off + tuple_len]);
            }
        }
        bytes
    }

    /// The page's identity.
    #[inline]
    pub fn pid(&self) -> PageId {
        self.pid
    }

    /// The table's record layout.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of free slots.
    pub fn empty_slots(&self) -> usize {
        self.used.iter().filter(|u| !**u).count()
    }

    /// Whether slot `slot` currently holds a tuple.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.used.get(slot).copied().unwrap_or(false)
    }

    /// Insert a tuple into the first free slot, recording its new location
    /// on the tuple. Fails if the tuple doesn't fit the schema or no slot
    /// is free.
    pub fn insert(&mut self, mut tuple: Tuple) -> Result<usize> {
        if !tuple.matches(&self.schema) {
            return Err(Error::SchemaMismatch);
        }
        let slot = self
            .used
            .iter()
            .position(|u| !*u)
            .ok_or_else(|| Error::InvariantViolation(format!("{} has no free slot", self.pid)))?;

        tuple.set_record_id(Some(RecordId {
            page: self.pid,
            slot,
        }));
        self.used[slot] = true;
        self.tuples[slot] = Some(tuple);
        Ok(slot)
    }

    /// Remove the tuple at `rid`. The slot must belong to this page and be
    /// occupied; anything else is a collaborator bug.
    pub fn remove(&mut self, rid: RecordId) -> Result<()> {
        if rid.page != self.pid {
            return Err(Error::InvariantViolation(format!(
                "record of {} deleted through {}",
                rid.page, self.pid
            )));
        }
        if !self.is_slot_used(rid.slot) {
            return Err(Error::InvariantViolation(format!(
                "slot {} of {} is not occupied",
                rid.slot, self.pid
            )));
        }
        self.used[rid.slot] = false;
        self.tuples[rid.slot] = None;
        Ok(())
    }

    /// Iterate the stored tuples in slot order.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(|t| t.as_ref())
    }

    // ========================================================================
    // Dirty tracking and before-image
    // ========================================================================

    /// The transaction owning an unflushed mutation, if any.
    #[inline]
    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    /// Mark the page dirty on behalf of `tx`.
    #[inline]
    pub fn mark_dirty(&mut self, tx: TransactionId) {
        self.dirtier = Some(tx);
    }

    /// Clear the dirty marker (after a flush).
    #[inline]
    pub fn mark_clean(&mut self) {
        self.dirtier = None;
    }

    /// The byte snapshot from the last clean point.
    #[inline]
    pub fn before_image(&self) -> &[u8] {
        &self.before_image
    }

    /// Re-snapshot the current contents as the new before-image.
    ///
    /// Called by the owning layer at durability checkpoints (after a
    /// committed flush), never automatically on mutation.
    pub fn set_before_image(&mut self) {
        self.before_image = self.to_bytes();
    }
}
