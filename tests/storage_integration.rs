//! Pool + heap file + WAL integration: persistence across engine
//! restarts, administrative flush/discard, and log ordering.

use std::sync::Arc;

use galena::{
    BufferPool, Catalog, Field, FieldType, HeapFile, LockMode, PageId, Schema, TransactionId,
    Tuple, WalManager,
};
use tempfile::tempdir;

const TEST_PAGE_SIZE: usize = 64;

fn int_schema() -> Schema {
    Schema::new(vec![FieldType::Int])
}

fn int_tuple(v: i32) -> Tuple {
    Tuple::new(vec![Field::Int(v)])
}

fn open_pool(dir: &std::path::Path) -> Arc<BufferPool> {
    let catalog = Arc::new(Catalog::new());
    let file = Arc::new(
        HeapFile::with_page_size(dir.join("t.tbl"), 1, int_schema(), TEST_PAGE_SIZE).unwrap(),
    );
    catalog.add_table("t", file);
    let wal = Arc::new(WalManager::open(dir.join("wal")).unwrap());
    Arc::new(BufferPool::new(8, catalog, wal))
}

#[test]
fn committed_rows_survive_an_engine_restart() {
    let dir = tempdir().unwrap();

    // First engine instance: insert across several pages and commit.
    {
        let pool = open_pool(dir.path());
        let tx = TransactionId::fresh();
        for v in 0..40 {
            pool.insert_tuple(tx, 1, int_tuple(v)).unwrap();
        }
        pool.commit(tx).unwrap();
    }

    // Second instance over the same files sees every row.
    let pool = open_pool(dir.path());
    let tx = TransactionId::fresh();
    let file = pool.catalog().file(1).unwrap();
    assert_eq!(file.page_count().unwrap(), 3);

    let mut values = vec![];
    for pno in 0..3 {
        let page = pool
            .get_page(tx, PageId::new(1, pno), LockMode::Shared)
            .unwrap();
        for t in page.read().tuples() {
            if let Field::Int(v) = t.field(0) {
                values.push(*v);
            }
        }
    }
    pool.commit(tx).unwrap();
    values.sort_unstable();
    assert_eq!(values, (0..40).collect::<Vec<i32>>());
}

#[test]
fn flush_all_persists_uncommitted_work() {
    let dir = tempdir().unwrap();
    let pool = open_pool(dir.path());

    let tx = TransactionId::fresh();
    pool.insert_tuple(tx, 1, int_tuple(11)).unwrap();

    // Administrative flush while the transaction is still open.
    pool.flush_all().unwrap();

    let on_disk = pool.catalog().file(1).unwrap().read_page(0).unwrap();
    assert_eq!(on_disk.tuples().count(), 1);

    // The page is clean now, so a later abort has nothing to discard in
    // dirty form - exactly why flush_all is unsafe under no-steal.
    pool.abort(tx);
    let on_disk = pool.catalog().file(1).unwrap().read_page(0).unwrap();
    assert_eq!(on_disk.tuples().count(), 1);
}

#[test]
fn discard_page_forces_a_reload_from_disk() {
    let dir = tempdir().unwrap();
    let pool = open_pool(dir.path());

    let tx = TransactionId::fresh();
    pool.insert_tuple(tx, 1, int_tuple(1)).unwrap();
    pool.commit(tx).unwrap();

    let pid = PageId::new(1, 0);
    assert!(pool.contains_page(pid));
    pool.discard_page(pid);
    assert!(!pool.contains_page(pid));

    // Reload sees the committed on-disk state.
    let tx2 = TransactionId::fresh();
    let page = pool.get_page(tx2, pid, LockMode::Shared).unwrap();
    assert_eq!(page.read().tuples().count(), 1);
    pool.commit(tx2).unwrap();
    assert_eq!(pool.stats().snapshot().cache_misses, 2);
}

#[test]
fn wal_records_appear_only_on_flush() {
    let dir = tempdir().unwrap();
    let catalog = Arc::new(Catalog::new());
    let file = Arc::new(
        HeapFile::with_page_size(dir.path().join("t.tbl"), 1, int_schema(), TEST_PAGE_SIZE)
            .unwrap(),
    );
    catalog.add_table("t", file);
    let wal = Arc::new(WalManager::open(dir.path().join("wal")).unwrap());
    let pool = Arc::new(BufferPool::new(8, catalog, Arc::clone(&wal)));

    // Mutating logs nothing.
    let tx = TransactionId::fresh();
    pool.insert_tuple(tx, 1, int_tuple(5)).unwrap();
    assert_eq!(wal.next_lsn(), 0);

    // Aborting logs nothing either - the medium was never touched.
    pool.abort(tx);
    assert_eq!(wal.next_lsn(), 0);

    // A commit that flushes one page appends exactly one record.
    let tx2 = TransactionId::fresh();
    pool.insert_tuple(tx2, 1, int_tuple(6)).unwrap();
    pool.commit(tx2).unwrap();
    let after_one = wal.next_lsn();
    assert!(after_one > 0);

    // A read-only transaction appends nothing.
    let tx3 = TransactionId::fresh();
    pool.get_page(tx3, PageId::new(1, 0), LockMode::Shared).unwrap();
    pool.commit(tx3).unwrap();
    assert_eq!(wal.next_lsn(), after_one);
}

#[test]
fn before_image_tracks_the_last_clean_point() {
    let dir = tempdir().unwrap();
    let pool = open_pool(dir.path());

    // Commit a first row: the flush re-snapshots the before-image.
    let tx1 = TransactionId::fresh();
    pool.insert_tuple(tx1, 1, int_tuple(1)).unwrap();
    pool.commit(tx1).unwrap();

    // Dirty the page again; its before-image must reflect the committed
    // state (one row), not the empty page it was first loaded as.
    let tx2 = TransactionId::fresh();
    pool.insert_tuple(tx2, 1, int_tuple(2)).unwrap();

    let pid = PageId::new(1, 0);
    let page = pool.get_page(tx2, pid, LockMode::Exclusive).unwrap();
    let before = page.read().before_image().to_vec();
    drop(page);

    let decoded = galena::HeapPage::from_bytes(pid, &before, int_schema()).unwrap();
    assert_eq!(decoded.tuples().count(), 1);
    pool.commit(tx2).unwrap();
}
