//! Map types used by the engine's internal bookkeeping.

/// Hash map keyed with the crate's default hasher.
pub type HashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// Hash set keyed with the crate's default hasher.
pub type HashSet<T> = hashbrown::HashSet<T, ahash::RandomState>;
