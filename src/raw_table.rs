//! RawTable: the unsynchronized extendible hash table.
//!
//! Owns the hasher, the directory and the key count. Every method assumes the
//! caller already holds whatever exclusion it needs; `ExtendibleHashTable`
//! wraps this in a single readers-writer lock.

use crate::bucket::Bucket;
use crate::directory::Directory;
use crate::error::InvariantError;
use crate::hasher::KeyHasher;
use hashbrown::HashMap;
use log::warn;

/// How far the table goes to bring an overflowing bucket back under capacity.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SplitPolicy {
    /// Keep splitting the bucket that holds the new key while it is over
    /// capacity and its entries can still be told apart by some hash bit
    /// below the depth ceiling.
    #[default]
    UntilFit,
    /// Split exactly once per overflow. A bucket may be left over capacity
    /// when the new bit fails to separate its keys; later overflows keep
    /// splitting it.
    SinglePass,
}

/// Counters read together under one lock acquisition.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TableStats {
    pub num_keys: usize,
    pub global_depth: u32,
    pub num_buckets: usize,
    pub num_directory_slots: usize,
    pub bucket_capacity: usize,
}

#[derive(Debug)]
pub(crate) struct RawTable<K, V, H> {
    hasher: H,
    directory: Directory<K, V>,
    bucket_capacity: usize,
    num_keys: usize,
    split_policy: SplitPolicy,
    max_global_depth: u32,
}

impl<K, V, H> RawTable<K, V, H>
where
    K: Eq,
    H: KeyHasher<K>,
{
    pub(crate) fn new(
        bucket_capacity: usize,
        hasher: H,
        split_policy: SplitPolicy,
        max_global_depth: u32,
    ) -> Self {
        Self {
            hasher,
            directory: Directory::new(bucket_capacity),
            bucket_capacity,
            num_keys: 0,
            split_policy,
            max_global_depth,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.num_keys
    }

    pub(crate) fn global_depth(&self) -> u32 {
        self.directory.global_depth()
    }

    pub(crate) fn num_buckets(&self) -> usize {
        self.directory.num_buckets()
    }

    pub(crate) fn num_directory_slots(&self) -> usize {
        self.directory.num_slots()
    }

    pub(crate) fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    pub(crate) fn split_policy(&self) -> SplitPolicy {
        self.split_policy
    }

    pub(crate) fn max_global_depth(&self) -> u32 {
        self.max_global_depth
    }

    pub(crate) fn stats(&self) -> TableStats {
        TableStats {
            num_keys: self.num_keys,
            global_depth: self.global_depth(),
            num_buckets: self.num_buckets(),
            num_directory_slots: self.num_directory_slots(),
            bucket_capacity: self.bucket_capacity,
        }
    }

    pub(crate) fn local_depth(&self, slot: usize) -> Option<u32> {
        self.directory.bucket_at_slot(slot).map(Bucket::local_depth)
    }

    fn slot_of(&self, key: &K) -> (u64, usize) {
        let hash = self.hasher.hash_key(key);
        (hash, self.directory.index_of(hash))
    }

    pub(crate) fn find(&self, key: &K) -> Option<&V> {
        let (_, slot) = self.slot_of(key);
        self.directory.bucket(slot).find(key)
    }

    /// Inserts or updates `key`, growing the directory as needed. Returns the
    /// previous value when the key was already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (hash, slot) = self.slot_of(&key);
        let bucket = self.directory.bucket_mut(slot);
        // Updates never grow a bucket, so a full bucket only overflows on a
        // fresh key.
        let was_full = bucket.is_full();
        if let Err(old) = bucket.insert_or_update(key, value, hash) {
            return Some(old);
        }
        self.num_keys += 1;
        if was_full {
            self.resolve_overflow(hash);
        }
        None
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let (_, slot) = self.slot_of(key);
        let removed = self.directory.bucket_mut(slot).remove(key)?;
        self.num_keys -= 1;
        Some(removed)
    }

    /// Splits the bucket that just received the entry hashed to `hash`.
    ///
    /// A split divides `capacity + 1` entries, so at most one side can remain
    /// over capacity, and that side still holds the new entry. Following
    /// `hash` therefore always finds the bucket that needs more work.
    fn resolve_overflow(&mut self, hash: u64) {
        let mut splits = 0usize;
        loop {
            let slot = self.directory.index_of(hash);
            let bucket = self.directory.bucket(slot);
            if !bucket.is_over_capacity() {
                return;
            }
            if splits > 0 && self.split_policy == SplitPolicy::SinglePass {
                return;
            }
            let depth = bucket.local_depth();
            if depth >= self.max_global_depth {
                warn!(
                    "bucket at depth ceiling {} holds {} entries over capacity {}",
                    self.max_global_depth,
                    bucket.len(),
                    self.bucket_capacity
                );
                return;
            }
            if self.split_policy == SplitPolicy::UntilFit
                && !bucket.is_separable_within(self.max_global_depth)
            {
                warn!(
                    "{} entries share every hash bit below depth {}; bucket left over capacity {}",
                    bucket.len(),
                    self.max_global_depth,
                    self.bucket_capacity
                );
                return;
            }
            self.directory.split(slot);
            splits += 1;
        }
    }

    #[cfg(test)]
    pub(crate) fn max_bucket_len(&self) -> usize {
        self.directory
            .buckets()
            .map(|(_, b, _)| b.len())
            .max()
            .unwrap_or(0)
    }

    /// Checks every structural invariant, returning the first violation.
    pub(crate) fn validate(&self) -> Result<(), InvariantError> {
        let global_depth = self.directory.global_depth();
        let slots = self.directory.slots();
        let expected = 1usize << global_depth;
        if slots.len() != expected {
            return Err(InvariantError::DirectorySize {
                slots: slots.len(),
                global_depth,
                expected,
            });
        }

        // Count aliases directly from the slot array rather than trusting
        // the directory's own bookkeeping.
        let mut aliases: HashMap<_, usize> = HashMap::new();
        for &k in slots {
            *aliases.entry(k).or_insert(0) += 1;
        }
        if aliases.len() != self.directory.num_buckets() {
            return Err(InvariantError::BucketCount {
                pooled: self.directory.num_buckets(),
                reachable: aliases.len(),
            });
        }

        let mut stored = 0usize;
        for (key, bucket, tracked) in self.directory.buckets() {
            let local_depth = bucket.local_depth();
            if local_depth > global_depth {
                return Err(InvariantError::LocalDepthExceedsGlobal {
                    local_depth,
                    global_depth,
                });
            }
            let expected = 1usize << (global_depth - local_depth);
            let actual = aliases.get(&key).copied().unwrap_or(0);
            if actual != expected || tracked != expected {
                return Err(InvariantError::ReferenceCount {
                    local_depth,
                    expected,
                    actual,
                });
            }
            stored += bucket.len();
        }

        for slot in 0..slots.len() {
            let bucket = self.directory.bucket(slot);
            // Visit each bucket once, from the lowest slot aliasing it.
            let low_mask = (1usize << bucket.local_depth()) - 1;
            if slot & low_mask != slot {
                continue;
            }
            let entries = bucket.entries();
            for (i, e) in entries.iter().enumerate() {
                let expected_slot = self.directory.index_of(e.hash);
                if expected_slot & low_mask != slot {
                    return Err(InvariantError::MisplacedKey {
                        hash: e.hash,
                        slot,
                        expected_slot,
                    });
                }
                if entries[i + 1..].iter().any(|o| o.key == e.key) {
                    return Err(InvariantError::DuplicateKey);
                }
            }
        }

        if stored != self.num_keys {
            return Err(InvariantError::KeyCount {
                recorded: self.num_keys,
                actual: stored,
            });
        }
        Ok(())
    }
}
