/// Rejected table configuration, reported by [`Builder::build`].
///
/// [`Builder::build`]: ./struct.Builder.html#method.build
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Buckets must hold at least one entry.
    #[error("bucket capacity must be greater than zero")]
    ZeroCapacity,

    /// No hash function was supplied.
    #[error("a key hasher is required; call `hasher` or `build_hasher` on the builder")]
    MissingHasher,

    /// The directory cannot be addressed with this many bits.
    #[error("max global depth {requested} exceeds the supported limit of {limit}")]
    MaxDepthTooLarge { requested: u32, limit: u32 },
}

/// A broken structural invariant, reported by
/// [`ExtendibleHashTable::validate`].
///
/// [`ExtendibleHashTable::validate`]: ./struct.ExtendibleHashTable.html#method.validate
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("directory has {slots} slots but global depth {global_depth} requires {expected}")]
    DirectorySize {
        slots: usize,
        global_depth: u32,
        expected: usize,
    },

    #[error("bucket local depth {local_depth} exceeds global depth {global_depth}")]
    LocalDepthExceedsGlobal { local_depth: u32, global_depth: u32 },

    #[error("bucket at local depth {local_depth} is referenced by {actual} slots, expected {expected}")]
    ReferenceCount {
        local_depth: u32,
        expected: usize,
        actual: usize,
    },

    #[error("entry with hash {hash:#x} is stored behind slot {slot} but addresses slot {expected_slot}")]
    MisplacedKey {
        hash: u64,
        slot: usize,
        expected_slot: usize,
    },

    #[error("a key is stored more than once")]
    DuplicateKey,

    #[error("key count is {recorded} but buckets hold {actual} entries")]
    KeyCount { recorded: usize, actual: usize },

    #[error("{pooled} buckets are pooled but {reachable} are reachable from the directory")]
    BucketCount { pooled: usize, reachable: usize },
}
