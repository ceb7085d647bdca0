//! Caller-supplied key hashing.
//!
//! The table never hashes keys on its own; it asks a `KeyHasher` once per
//! operation and addresses the directory by the low bits of the result. The
//! hasher must return the same value for the same key for the lifetime of the
//! table. Its bit distribution decides how evenly buckets split.

use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

pub trait KeyHasher<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
}

impl<K, F> KeyHasher<K> for F
where
    K: ?Sized,
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self(key)
    }
}

/// Adapts any `BuildHasher` (e.g. `RandomState`) into a `KeyHasher` over
/// `K: Hash`.
#[derive(Clone, Debug, Default)]
pub struct BuildHasherAdapter<S = RandomState>(pub S);

impl<K, S> KeyHasher<K> for BuildHasherAdapter<S>
where
    K: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.0.hash_one(key)
    }
}
