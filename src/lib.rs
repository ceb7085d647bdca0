//! extendible-hash: a thread-safe extendible hash table with amortized O(1)
//! lookup, insertion and deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a growable directory of fixed-capacity buckets, addressed by the
//!   low-order bits of a caller-supplied hash, built in layers that can each
//!   be checked on their own.
//! - Layers:
//!   - Bucket<K, V>: insertion-ordered entries plus a local depth. Knows
//!     nothing about the directory.
//!   - Directory<K, V>: `2^global_depth` slots of generational keys into a
//!     bucket pool; owns doubling, splitting and slot rewiring.
//!   - RawTable<K, V, H>: unsynchronized table; hashing, key count, the
//!     overflow protocol and invariant validation.
//!   - ExtendibleHashTable<K, V, H>: public API; one `RwLock` over RawTable.
//!
//! Constraints
//! - Thread-safe through a single coarse lock: readers share it, writers
//!   hold it exclusively for the whole operation including any growth.
//! - No bucket merging and no directory shrink. Removal only drops entries.
//! - No per-slot bucket copies: slots alias buckets by key, with per-bucket
//!   slot reference counts kept next to the pool.
//! - The hasher is external. It must be deterministic for the lifetime of a
//!   table; its bit distribution decides split balance.
//!
//! Overflow semantics
//! - Inserting a fresh key into a full bucket appends it anyway, then splits
//!   the bucket on its next hash bit (doubling the directory first when the
//!   bucket's local depth equals the global depth).
//! - `SplitPolicy::UntilFit` (default) repeats the split while the bucket
//!   holding the new key is still over capacity and its entries differ in some
//!   bit below the depth ceiling. `SplitPolicy::SinglePass` splits exactly
//!   once per overflow.
//! - Keys whose hashes agree on every bit below the ceiling cannot be
//!   separated; they share one over-capacity bucket and a warning is logged.
//!
//! Hasher invariants
//! - Each entry stores its `u64` hash at insertion. Splits and validation use
//!   the stored hash; the hasher runs once per public operation and never
//!   while entries are being moved.
//!
//! Notes and non-goals
//! - No persistence, no iteration API, no multi-table transactions.
//! - Per-bucket locking would lift the writer serialization; the directory is
//!   the piece that would need its own synchronization.

mod bucket;
mod builder;
mod directory;
mod error;
mod hash_table;
mod hasher;
mod raw_table;
mod raw_table_proptest;

// Public surface
pub use builder::{Builder, DEFAULT_MAX_GLOBAL_DEPTH, MAX_GLOBAL_DEPTH_LIMIT};
pub use error::{BuildError, InvariantError};
pub use hash_table::ExtendibleHashTable;
pub use hasher::{BuildHasherAdapter, KeyHasher};
pub use raw_table::{SplitPolicy, TableStats};
