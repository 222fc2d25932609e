//! Deterministic identity hashing for the cryptomatte encoding.
//!
//! Ids are hashed as their decimal string with MurmurHash3 (x86, 32-bit,
//! seed 0) and stored in float channels by reinterpreting the bit pattern.
//! Same id, same hash, always; collisions between distinct ids are possible
//! and accepted.

/// MurmurHash3 x86 32-bit.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e2d51;
    const C2: u32 = 0x1b873593;

    let mut h1 = seed;

    let mut chunks = data.chunks_exact(4);
    for block in &mut chunks {
        let mut k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k1: u32 = 0;
        for (i, &byte) in tail.iter().enumerate() {
            k1 ^= (byte as u32) << (8 * i);
        }
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    // Finalization avalanche
    h1 ^= data.len() as u32;
    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85ebca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2ae35);
    h1 ^= h1 >> 16;

    h1
}

/// Hash an object or material id: decimal string, seed 0.
pub fn hash_id(id: i32) -> u32 {
    murmur3_32(id.to_string().as_bytes(), 0)
}

/// Bit-level reinterpretation of the hash as an IEEE-754 float.
/// No numeric conversion happens here.
pub fn id_hash_to_f32(hash: u32) -> f32 {
    f32::from_bits(hash)
}

/// Lowercase 8-hex-digit rendering used as the manifest key.
pub fn to_hex8(hash: u32) -> String {
    format!("{hash:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_reference_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"hello", 0), 0x248bfa47);
        assert_eq!(murmur3_32(b"test", 0), 0xba6bd213);
    }

    #[test]
    fn test_hash_id_deterministic() {
        assert_eq!(hash_id(1), hash_id(1));
        assert_eq!(hash_id(1), murmur3_32(b"1", 0));
        assert_eq!(hash_id(-1), murmur3_32(b"-1", 0));
    }

    #[test]
    fn test_distinct_ids_hash_differently() {
        // Not guaranteed in general, but these must not collide
        assert_ne!(hash_id(3), hash_id(7));
        assert_ne!(hash_id(0), hash_id(1));
    }

    #[test]
    fn test_bit_reinterpretation_roundtrip() {
        let hash = hash_id(42);
        assert_eq!(id_hash_to_f32(hash).to_bits(), hash);
    }

    #[test]
    fn test_hex8_width() {
        assert_eq!(to_hex8(0x1), "00000001");
        assert_eq!(to_hex8(0xdeadbeef), "deadbeef");
        assert_eq!(to_hex8(hash_id(1)).len(), 8);
    }
}
