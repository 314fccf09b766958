use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Hashes a string into a stable `u64`. Used to derive a distinct seed for each
/// named random stream from the run's base seed.
pub fn hash_str(data: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_bytes());
    hasher.finish()
}
