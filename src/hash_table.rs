//! ExtendibleHashTable: the public, lock-guarded table.

use crate::builder::{Builder, DEFAULT_MAX_GLOBAL_DEPTH};
use crate::error::InvariantError;
use crate::hasher::{BuildHasherAdapter, KeyHasher};
use crate::raw_table::{RawTable, SplitPolicy, TableStats};

use core::fmt;
use core::hash::Hash;
use parking_lot::RwLock;
use std::collections::hash_map::RandomState;

/// A thread-safe extendible hash table.
///
/// Keys are addressed by the low `global_depth` bits of a caller-supplied
/// hash. Each directory slot points at a bucket of fixed capacity; when a
/// bucket overflows it is split on its next hash bit, doubling the directory
/// first if the bucket already uses every addressing bit. Buckets are never
/// merged and the directory never shrinks.
///
/// All state sits behind one readers-writer lock: lookups and accessors share
/// it, while `insert` and `remove` hold it exclusively for their whole run,
/// including any doubling and splitting. Shared acquisitions are recursive,
/// so a reader may re-enter the read side even while a writer is queued.
///
/// # Examples
///
/// ```rust
/// use extendible_hash::ExtendibleHashTable;
///
/// let table = ExtendibleHashTable::new(2, |k: &u64| *k);
/// for k in 0..8 {
///     table.insert(k, k * 10);
/// }
/// assert_eq!(table.len(), 8);
/// assert_eq!(table.find(&3), Some(30));
/// assert_eq!(table.num_directory_slots(), 1 << table.global_depth());
///
/// assert!(table.remove(&3));
/// assert!(!table.remove(&3));
/// assert_eq!(table.find(&3), None);
/// ```
pub struct ExtendibleHashTable<K, V, H = BuildHasherAdapter<RandomState>> {
    inner: RwLock<RawTable<K, V, H>>,
}

impl<K, V> ExtendibleHashTable<K, V>
where
    K: Eq + Hash,
{
    /// Creates a table hashing keys with a fresh `RandomState`.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_capacity` is zero.
    pub fn with_bucket_capacity(bucket_capacity: usize) -> Self {
        Self::new(bucket_capacity, BuildHasherAdapter(RandomState::new()))
    }
}

impl<K, V, H> ExtendibleHashTable<K, V, H>
where
    K: Eq,
    H: KeyHasher<K>,
{
    /// Creates an empty table: one bucket behind a one-slot directory.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_capacity` is zero. Use [`builder`](#method.builder)
    /// to get the error as a value instead.
    pub fn new(bucket_capacity: usize, hasher: H) -> Self {
        assert!(bucket_capacity > 0, "bucket capacity must be greater than zero");
        Self::with_everything(
            bucket_capacity,
            hasher,
            SplitPolicy::default(),
            DEFAULT_MAX_GLOBAL_DEPTH,
        )
    }

    /// Returns a [`Builder`] for tables whose buckets hold `bucket_capacity`
    /// entries.
    pub fn builder(bucket_capacity: usize) -> Builder<K, V, H> {
        Builder::new(bucket_capacity)
    }

    pub(crate) fn with_everything(
        bucket_capacity: usize,
        hasher: H,
        split_policy: SplitPolicy,
        max_global_depth: u32,
    ) -> Self {
        Self {
            inner: RwLock::new(RawTable::new(
                bucket_capacity,
                hasher,
                split_policy,
                max_global_depth,
            )),
        }
    }

    /// Returns a clone of the value stored for `key`.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.read_recursive().find(key).cloned()
    }

    /// Runs `reader` on the value stored for `key` while holding the shared
    /// lock. `reader` may call the table's read-side methods (`find`, `len`,
    /// `stats` and the other accessors).
    ///
    /// # Deadlocks
    ///
    /// Calling `insert`, `remove` or `take` from inside `reader` deadlocks:
    /// the write lock waits for the shared lock this call still holds.
    pub fn read<R, F>(&self, key: &K, reader: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.inner.read_recursive().find(key).map(reader)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read_recursive().find(key).is_some()
    }

    /// Inserts `key`, or overwrites its value in place if already present.
    /// Never fails: a full bucket is split, doubling the directory when
    /// needed.
    ///
    /// Returns the previous value when the key was present.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    /// Removes `key`, returning whether it was present. Buckets are never
    /// merged and the directory never shrinks.
    pub fn remove(&self, key: &K) -> bool {
        self.inner.write().remove(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn take(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of low-order hash bits used to address the directory.
    pub fn global_depth(&self) -> u32 {
        self.inner.read_recursive().global_depth()
    }

    /// Number of distinct buckets.
    pub fn num_buckets(&self) -> usize {
        self.inner.read_recursive().num_buckets()
    }

    /// Number of directory slots; always `2^global_depth`.
    pub fn num_directory_slots(&self) -> usize {
        self.inner.read_recursive().num_directory_slots()
    }

    /// Local depth of the bucket behind directory slot `slot`, or `None` if
    /// the slot is out of range.
    pub fn local_depth(&self, slot: usize) -> Option<u32> {
        self.inner.read_recursive().local_depth(slot)
    }

    pub fn bucket_capacity(&self) -> usize {
        self.inner.read_recursive().bucket_capacity()
    }

    pub fn split_policy(&self) -> SplitPolicy {
        self.inner.read_recursive().split_policy()
    }

    pub fn max_global_depth(&self) -> u32 {
        self.inner.read_recursive().max_global_depth()
    }

    /// Reads every counter under a single lock acquisition, so the values
    /// are consistent with each other.
    pub fn stats(&self) -> TableStats {
        self.inner.read_recursive().stats()
    }

    /// Walks the whole structure and checks its invariants: directory size,
    /// local depths, slot reference counts, key placement, key uniqueness and
    /// the key count. Intended for tests and debugging; cost is linear in the
    /// table size.
    pub fn validate(&self) -> Result<(), InvariantError> {
        self.inner.read_recursive().validate()
    }
}

impl<K, V, H> fmt::Debug for ExtendibleHashTable<K, V, H>
where
    K: Eq,
    H: KeyHasher<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("ExtendibleHashTable")
            .field("num_keys", &stats.num_keys)
            .field("global_depth", &stats.global_depth)
            .field("num_buckets", &stats.num_buckets)
            .field("bucket_capacity", &stats.bucket_capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_bits(k: &u32) -> u64 {
        u64::from(*k)
    }

    #[test]
    fn new_table_shape() {
        let t: ExtendibleHashTable<u32, u32, _> = ExtendibleHashTable::new(3, low_bits);
        assert!(t.is_empty());
        assert_eq!(t.global_depth(), 0);
        assert_eq!(t.num_buckets(), 1);
        assert_eq!(t.num_directory_slots(), 1);
        assert_eq!(t.local_depth(0), Some(0));
        assert_eq!(
            t.stats(),
            TableStats {
                num_keys: 0,
                global_depth: 0,
                num_buckets: 1,
                num_directory_slots: 1,
                bucket_capacity: 3,
            }
        );
    }

    #[test]
    #[should_panic(expected = "bucket capacity must be greater than zero")]
    fn zero_capacity_panics() {
        let _t: ExtendibleHashTable<u32, u32, _> = ExtendibleHashTable::new(0, low_bits);
    }

    #[test]
    fn read_borrows_without_clone() {
        let t = ExtendibleHashTable::new(2, low_bits);
        t.insert(7, vec![1, 2, 3]);
        assert_eq!(t.read(&7, |v| v.len()), Some(3));
        assert_eq!(t.read(&8, |v| v.len()), None);
        assert!(t.contains_key(&7));
        assert!(!t.contains_key(&8));
    }

    #[test]
    fn take_returns_value() {
        let t = ExtendibleHashTable::new(2, low_bits);
        assert_eq!(t.insert(1, "x"), None);
        assert_eq!(t.insert(1, "y"), Some("x"));
        assert_eq!(t.take(&1), Some("y"));
        assert_eq!(t.take(&1), None);
        assert!(t.is_empty());
    }

    #[test]
    fn growth_keeps_invariants() {
        let t = ExtendibleHashTable::new(2, low_bits);
        for k in 0..64 {
            t.insert(k, k);
            t.validate().unwrap();
            assert_eq!(t.num_directory_slots(), 1 << t.global_depth());
        }
        // Sequential keys under an identity hash fill every slot evenly.
        assert_eq!(t.global_depth(), 5);
        assert_eq!(t.num_buckets(), 32);
        for k in 0..64 {
            assert_eq!(t.find(&k), Some(k));
        }
    }

    #[test]
    fn default_hasher_table() {
        let t = ExtendibleHashTable::with_bucket_capacity(4);
        for i in 0..100 {
            t.insert(format!("key-{i}"), i);
        }
        assert_eq!(t.len(), 100);
        assert_eq!(t.find(&"key-42".to_string()), Some(42));
        t.validate().unwrap();
    }

    #[test]
    fn debug_reports_counters() {
        let t = ExtendibleHashTable::new(2, low_bits);
        t.insert(1, 1);
        let s = format!("{t:?}");
        assert!(s.contains("num_keys: 1"), "{s}");
        assert!(s.contains("global_depth: 0"), "{s}");
    }
}
