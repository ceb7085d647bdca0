//! Bucket: fixed-capacity, insertion-ordered run of entries plus a local depth.

#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    // Cached at insertion; splits and validation never call the hasher again.
    pub(crate) hash: u64,
}

#[derive(Debug)]
pub(crate) struct Bucket<K, V> {
    capacity: usize,
    local_depth: u32,
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Bucket<K, V>
where
    K: Eq,
{
    pub(crate) fn new(capacity: usize, local_depth: u32) -> Self {
        Self {
            capacity,
            local_depth,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn local_depth(&self) -> u32 {
        self.local_depth
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    /// True once the bucket holds `capacity` entries or more.
    pub(crate) fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// True only while a split is pending or could not be carried out.
    pub(crate) fn is_over_capacity(&self) -> bool {
        self.entries.len() > self.capacity
    }

    pub(crate) fn find(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|e| e.key == *key).map(|e| &e.value)
    }

    /// Overwrites the value of an existing key in place, or appends a new
    /// entry. Never rejects on capacity; overflow is the table's concern.
    ///
    /// Returns `Ok(())` when appended, `Err(old)` with the displaced value
    /// when the key was already present.
    pub(crate) fn insert_or_update(&mut self, key: K, value: V, hash: u64) -> Result<(), V> {
        if let Some(e) = self.entries.iter_mut().find(|e| e.key == key) {
            return Err(core::mem::replace(&mut e.value, value));
        }
        self.entries.push(Entry { key, value, hash });
        Ok(())
    }

    /// Removes the matching entry, keeping the others in their order.
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.entries.iter().position(|e| e.key == *key)?;
        Some(self.entries.remove(pos).value)
    }

    pub(crate) fn increment_depth(&mut self) {
        self.local_depth += 1;
    }

    /// Moves every entry whose hash has `bit` set into a fresh sibling at this
    /// bucket's (already incremented) depth. Relative order is kept on both
    /// sides.
    pub(crate) fn split_off(&mut self, bit: u32) -> Self {
        let mask = 1u64 << bit;
        let (stay, moved): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|e| e.hash & mask == 0);
        self.entries = stay;
        Self {
            capacity: self.capacity,
            local_depth: self.local_depth,
            entries: moved,
        }
    }

    /// True when at least two entries differ somewhere in the low `depth`
    /// bits of their hashes, i.e. another split at or below `depth` could
    /// separate them.
    pub(crate) fn is_separable_within(&self, depth: u32) -> bool {
        let mask = if depth >= u64::BITS {
            u64::MAX
        } else {
            (1u64 << depth) - 1
        };
        match self.entries.split_first() {
            Some((first, rest)) => rest.iter().any(|e| (e.hash ^ first.hash) & mask != 0),
            None => false,
        }
    }
}
