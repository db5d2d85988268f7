//! Default-hasher indirection.
//!
//! Dependency-array comparison and keyed-child lookup both hash on the hot
//! path, so the crate defaults to `ahash`; the `std-hash` feature swaps in
//! the standard library hasher for environments that want it.

use std::hash::{Hash, Hasher};

#[cfg(not(feature = "std-hash"))]
pub type DefaultHasher = ahash::AHasher;

#[cfg(feature = "std-hash")]
pub type DefaultHasher = std::collections::hash_map::DefaultHasher;

/// Hashes a single value with the active default hasher.
#[inline]
pub fn hash_one<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
