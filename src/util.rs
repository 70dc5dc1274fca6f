//! Re-exports types depending on crate enabled features.

#[cfg(feature = "no-std")]
type BaseHashMap<K, V, S> = hashbrown::HashMap<K, V, S>;
#[cfg(not(feature = "no-std"))]
type BaseHashMap<K, V, S = std::collections::hash_map::RandomState> =
    std::collections::HashMap<K, V, S>;

#[cfg(feature = "fast-hasher")]
type FastState = core::hash::BuildHasherDefault<rustc_hash::FxHasher>;

#[cfg(feature = "fast-hasher")]
pub type HashMap<K, V> = BaseHashMap<K, V, FastState>;
#[cfg(not(feature = "fast-hasher"))]
pub type HashMap<K, V> = BaseHashMap<K, V>;
