//! Builder: configuration for `ExtendibleHashTable`.

use crate::error::BuildError;
use crate::hash_table::ExtendibleHashTable;
use crate::hasher::{BuildHasherAdapter, KeyHasher};
use crate::raw_table::SplitPolicy;

use core::hash::BuildHasher;
use core::marker::PhantomData;

/// Default ceiling on the number of addressing bits: at most `2^24` slots.
pub const DEFAULT_MAX_GLOBAL_DEPTH: u32 = 24;

/// Hard limit on the addressing bits: the slot count must fit in a `usize`
/// and the mask must fit in a `u64`.
pub const MAX_GLOBAL_DEPTH_LIMIT: u32 = if usize::BITS - 1 < 63 {
    usize::BITS - 1
} else {
    63
};

/// Builds an [`ExtendibleHashTable`][table-struct] with various configuration
/// knobs.
///
/// [table-struct]: ./struct.ExtendibleHashTable.html
///
/// # Examples
///
/// ```rust
/// use extendible_hash::{Builder, SplitPolicy};
///
/// let table = Builder::<u32, &str, _>::new(4)
///     // Any `Fn(&K) -> u64` works as the hasher.
///     .hasher(|k: &u32| u64::from(*k).wrapping_mul(0x9E37_79B9_7F4A_7C15))
///     .split_policy(SplitPolicy::UntilFit)
///     .max_global_depth(16)
///     .build()
///     .expect("valid configuration");
///
/// table.insert(1, "one");
/// assert_eq!(table.find(&1), Some("one"));
/// ```
pub struct Builder<K, V, H> {
    bucket_capacity: usize,
    hasher: Option<H>,
    split_policy: SplitPolicy,
    max_global_depth: u32,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V, H> Builder<K, V, H>
where
    K: Eq,
    H: KeyHasher<K>,
{
    /// Starts a builder for tables whose buckets hold `bucket_capacity`
    /// entries.
    pub fn new(bucket_capacity: usize) -> Self {
        Self {
            bucket_capacity,
            hasher: None,
            split_policy: SplitPolicy::default(),
            max_global_depth: DEFAULT_MAX_GLOBAL_DEPTH,
            _marker: PhantomData,
        }
    }

    /// Sets the key hasher.
    pub fn hasher(self, hasher: H) -> Self {
        Self {
            hasher: Some(hasher),
            ..self
        }
    }

    pub fn split_policy(self, split_policy: SplitPolicy) -> Self {
        Self {
            split_policy,
            ..self
        }
    }

    /// Caps the directory at `2^depth` slots. Buckets that would need more
    /// addressing bits are kept over capacity instead.
    ///
    /// The ceiling holds under both split policies and for any hasher: with
    /// small buckets, even well-distributed keys that happen to agree on
    /// their low `depth` bits end up sharing an over-capacity bucket (a
    /// `warn!` is logged) rather than growing the directory further.
    pub fn max_global_depth(self, depth: u32) -> Self {
        Self {
            max_global_depth: depth,
            ..self
        }
    }

    /// Builds the table, rejecting a zero capacity, a missing hasher or an
    /// unsupported depth ceiling.
    pub fn build(self) -> Result<ExtendibleHashTable<K, V, H>, BuildError> {
        if self.bucket_capacity == 0 {
            return Err(BuildError::ZeroCapacity);
        }
        if self.max_global_depth > MAX_GLOBAL_DEPTH_LIMIT {
            return Err(BuildError::MaxDepthTooLarge {
                requested: self.max_global_depth,
                limit: MAX_GLOBAL_DEPTH_LIMIT,
            });
        }
        let hasher = self.hasher.ok_or(BuildError::MissingHasher)?;
        Ok(ExtendibleHashTable::with_everything(
            self.bucket_capacity,
            hasher,
            self.split_policy,
            self.max_global_depth,
        ))
    }
}

impl<K, V, S> Builder<K, V, BuildHasherAdapter<S>>
where
    K: Eq + core::hash::Hash,
    S: BuildHasher,
{
    /// Sets the hasher from a `BuildHasher` such as `RandomState`.
    pub fn build_hasher(self, build_hasher: S) -> Self {
        self.hasher(BuildHasherAdapter(build_hasher))
    }
}
