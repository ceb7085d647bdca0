//! Directory: `2^global_depth` slots holding shared references into a bucket
//! pool.
//!
//! Buckets live in a `SlotMap`; a slot stores only the bucket's generational
//! key, so any number of slots can alias one bucket without duplicating its
//! storage. The number of slots aliasing each bucket is tracked alongside the
//! pool and a bucket is released from the pool once nothing refers to it.
//! Without merge or shrink that never happens today, but `retarget` is the
//! single place slots change owners, so the count stays exact.

use crate::bucket::Bucket;
use log::{debug, trace};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Stable identity of a bucket inside the pool.
    pub(crate) struct BucketKey;
}

#[derive(Debug)]
pub(crate) struct Directory<K, V> {
    global_depth: u32,
    slots: Vec<BucketKey>,
    buckets: SlotMap<BucketKey, Bucket<K, V>>,
    refs: SecondaryMap<BucketKey, usize>,
}

impl<K, V> Directory<K, V>
where
    K: Eq,
{
    /// One bucket at depth 0 behind a single slot.
    pub(crate) fn new(bucket_capacity: usize) -> Self {
        let mut buckets = SlotMap::with_key();
        let root = buckets.insert(Bucket::new(bucket_capacity, 0));
        let mut refs = SecondaryMap::new();
        refs.insert(root, 1);
        Self {
            global_depth: 0,
            slots: vec![root],
            buckets,
            refs,
        }
    }

    pub(crate) fn global_depth(&self) -> u32 {
        self.global_depth
    }

    pub(crate) fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Low-order `global_depth` bits of `hash`.
    #[inline]
    pub(crate) fn index_of(&self, hash: u64) -> usize {
        let mask = (1u64 << self.global_depth) - 1;
        (hash & mask) as usize
    }

    pub(crate) fn slots(&self) -> &[BucketKey] {
        &self.slots
    }

    pub(crate) fn bucket(&self, slot: usize) -> &Bucket<K, V> {
        &self.buckets[self.slots[slot]]
    }

    pub(crate) fn bucket_mut(&mut self, slot: usize) -> &mut Bucket<K, V> {
        &mut self.buckets[self.slots[slot]]
    }

    pub(crate) fn bucket_at_slot(&self, slot: usize) -> Option<&Bucket<K, V>> {
        self.slots.get(slot).and_then(|&k| self.buckets.get(k))
    }

    /// Every pooled bucket with the number of slots currently aliasing it.
    pub(crate) fn buckets(&self) -> impl Iterator<Item = (BucketKey, &Bucket<K, V>, usize)> + '_ {
        self.buckets
            .iter()
            .map(move |(k, b)| (k, b, self.refs.get(k).copied().unwrap_or(0)))
    }

    /// Doubles the slot array; slot `i + old_len` aliases the same bucket as
    /// slot `i` until a split rewires it.
    pub(crate) fn double(&mut self) {
        let old_len = self.slots.len();
        self.slots.extend_from_within(..);
        for (_, n) in self.refs.iter_mut() {
            *n *= 2;
        }
        self.global_depth += 1;
        debug!(
            "directory doubled: {} -> {} slots (global depth {})",
            old_len,
            self.slots.len(),
            self.global_depth
        );
    }

    /// Splits the bucket behind `slot` on its next hash bit, doubling the
    /// directory first when the bucket is already at global depth.
    ///
    /// Entries with that bit set move to a new sibling bucket, and every slot
    /// that referenced the original and has that bit set in its own index is
    /// rewired to the sibling. Returns the sibling's key.
    pub(crate) fn split(&mut self, slot: usize) -> BucketKey {
        let original = self.slots[slot];
        let depth = self.buckets[original].local_depth();
        if depth == self.global_depth {
            self.double();
        }

        let bucket = &mut self.buckets[original];
        bucket.increment_depth();
        let sibling = bucket.split_off(depth);
        let (stayed, moved) = (bucket.len(), sibling.len());
        let sibling = self.buckets.insert(sibling);
        self.refs.insert(sibling, 0);

        // Slots aliasing the original agree on the low `depth` bits; walk
        // exactly those, stepping over the bits above.
        let high_bit = 1usize << depth;
        let first = slot & (high_bit - 1);
        for i in (first..self.slots.len()).step_by(high_bit) {
            debug_assert_eq!(self.slots[i], original);
            if i & high_bit != 0 {
                self.retarget(i, sibling);
            }
        }

        debug!(
            "split bucket on bit {}: {} entries stay, {} move (local depth {})",
            depth,
            stayed,
            moved,
            depth + 1
        );
        sibling
    }

    /// Points `slot` at `to`, moving one reference between the two buckets.
    fn retarget(&mut self, slot: usize, to: BucketKey) {
        let from = core::mem::replace(&mut self.slots[slot], to);
        if let Some(n) = self.refs.get_mut(to) {
            *n += 1;
        }
        let remaining = match self.refs.get_mut(from) {
            Some(n) => {
                *n -= 1;
                *n
            }
            None => return,
        };
        if remaining == 0 {
            self.release(from);
        }
    }

    /// Drops a bucket nothing refers to any more.
    fn release(&mut self, key: BucketKey) -> Option<Bucket<K, V>> {
        self.refs.remove(key);
        let bucket = self.buckets.remove(key)?;
        trace!("released bucket with {} entries", bucket.len());
        Some(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(d: &mut Directory<u32, u32>, slot: usize, items: &[(u32, u64)]) {
        for &(k, h) in items {
            let _ = d.bucket_mut(slot).insert_or_update(k, k, h);
        }
    }

    #[test]
    fn starts_with_single_slot() {
        let d: Directory<u32, u32> = Directory::new(4);
        assert_eq!(d.global_depth(), 0);
        assert_eq!(d.num_slots(), 1);
        assert_eq!(d.num_buckets(), 1);
        assert_eq!(d.index_of(u64::MAX), 0);
        let counts: Vec<usize> = d.buckets().map(|(_, _, n)| n).collect();
        assert_eq!(counts, vec![1]);
    }

    /// Doubling mirrors the first half into the second and doubles every count.
    #[test]
    fn double_mirrors_slots() {
        let mut d: Directory<u32, u32> = Directory::new(1);
        d.double();
        d.double();
        assert_eq!(d.global_depth(), 2);
        assert_eq!(d.num_slots(), 4);
        assert!(d.slots().iter().all(|&k| k == d.slots()[0]));
        let counts: Vec<usize> = d.buckets().map(|(_, _, n)| n).collect();
        assert_eq!(counts, vec![4]);
        assert_eq!(d.index_of(0b1110), 0b10);
    }

    #[test]
    fn split_at_global_depth_doubles_first() {
        let mut d: Directory<u32, u32> = Directory::new(2);
        fill(&mut d, 0, &[(1, 0b0), (2, 0b1), (3, 0b11)]);
        let sibling = d.split(0);

        assert_eq!(d.global_depth(), 1);
        assert_eq!(d.num_slots(), 2);
        assert_eq!(d.num_buckets(), 2);
        assert_eq!(d.slots()[1], sibling);
        assert_eq!(d.bucket(0).len(), 1);
        assert_eq!(d.bucket(1).len(), 2);
        assert_eq!(d.bucket(0).local_depth(), 1);
        assert_eq!(d.bucket(1).local_depth(), 1);
    }

    /// A shallow bucket aliased by several slots splits without doubling and
    /// only its own slots are rewired.
    #[test]
    fn split_below_global_depth_rewires_aliases_only() {
        let mut d: Directory<u32, u32> = Directory::new(2);
        fill(&mut d, 0, &[(1, 0b00), (2, 0b01)]);
        d.split(0);
        // Global depth 1; push slot 1's bucket one level deeper.
        fill(&mut d, 1, &[(3, 0b11), (4, 0b111)]);
        d.split(1);
        assert_eq!(d.global_depth(), 2);
        let even = d.slots()[0];
        assert_eq!(d.slots()[2], even);
        assert_eq!(d.bucket(0).local_depth(), 1);

        // Now split the depth-1 bucket behind slots 0 and 2.
        fill(&mut d, 0, &[(5, 0b10)]);
        let before = d.slots().to_vec();
        let sibling = d.split(2);
        assert_eq!(d.global_depth(), 2);
        assert_eq!(d.slots()[0], even);
        assert_eq!(d.slots()[2], sibling);
        assert_eq!(d.slots()[1], before[1]);
        assert_eq!(d.slots()[3], before[3]);
        for (_, b, n) in d.buckets() {
            assert_eq!(n, 1 << (d.global_depth() - b.local_depth()));
        }
    }

    #[test]
    fn bucket_at_slot_out_of_range_is_none() {
        let d: Directory<u32, u32> = Directory::new(1);
        assert!(d.bucket_at_slot(0).is_some());
        assert!(d.bucket_at_slot(1).is_none());
    }
}
