//! Random sources for ambient selection, window offsets and silence jitter.
//!
//! Every random choice in the crate takes a caller-supplied `rand::Rng`.
//! Production runs seed from OS entropy; tests and reproducible renders use a
//! fixed seed, with BLAKE3 deriving an independent stream per component.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Component key for a mix (ambient file choice and window offset).
pub const MIX: &str = "mix";
/// Component key for a merge (silence jitter when spreading out phrases).
pub const MERGE: &str = "merge";
/// Component key for a full render.
pub const RENDER: &str = "render";

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The 32-bit seed is expanded to 64 bits by duplicating the value in both
/// halves, as required by PCG32's state initialization.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Creates a PCG32 RNG seeded from OS entropy.
pub fn entropy_rng() -> Pcg32 {
    Pcg32::from_entropy()
}

/// Derives a seed for a named component from the base seed.
///
/// Hashes the base seed (little-endian) followed by the UTF-8 key with BLAKE3
/// and keeps the first four bytes.
pub fn derive_component_seed(base_seed: u32, key: &str) -> u32 {
    let mut input = Vec::with_capacity(4 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());

    let hash = blake3::hash(&input);
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Creates the RNG for a named component.
///
/// With a seed the stream is reproducible; without one it comes from entropy.
pub fn component_rng(seed: Option<u32>, key: &str) -> Pcg32 {
    match seed {
        Some(seed) => create_rng(derive_component_seed(seed, key)),
        None => entropy_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);

        let values1: Vec<f32> = (0..100).map(|_| rng1.gen()).collect();
        let values2: Vec<f32> = (0..100).map(|_| rng2.gen()).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_component_seeds_are_independent() {
        let mix = derive_component_seed(7, MIX);
        let merge = derive_component_seed(7, MERGE);
        assert_ne!(mix, merge);
        assert_eq!(mix, derive_component_seed(7, MIX));
    }

    #[test]
    fn test_component_rng_with_seed_is_reproducible() {
        let mut a = component_rng(Some(3), RENDER);
        let mut b = component_rng(Some(3), RENDER);
        let va: Vec<u32> = (0..10).map(|_| a.gen_range(0..1000)).collect();
        let vb: Vec<u32> = (0..10).map(|_| b.gen_range(0..1000)).collect();
        assert_eq!(va, vb);
    }
}
