// lumen-core - Hash mixing for values and collections
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Murmur3-style hashing used by `Value::to_hash`.
//!
//! Collections combine element hashes in one of two ways:
//!
//! - [`ordered`] for sequential collections, where position matters
//! - [`unordered`] for maps and sets, where equal collections must hash
//!   equal no matter the order their entries were inserted in
//!
//! All functions are deterministic within and across processes.

const SEED: u32 = 0;
const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

#[inline]
fn mix_k1(k1: u32) -> u32 {
    k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn mix_h1(h1: u32, k1: u32) -> u32 {
    (h1 ^ k1)
        .rotate_left(13)
        .wrapping_mul(5)
        .wrapping_add(0xe654_6b64)
}

#[inline]
fn fmix(h1: u32, length: u32) -> u32 {
    let mut h1 = h1 ^ length;
    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85eb_ca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2_ae35);
    h1 ^= h1 >> 16;
    h1
}

/// Hash a 32-bit integer.
pub fn int32(input: u32) -> u32 {
    if input == 0 {
        return 0;
    }
    let h1 = mix_h1(SEED, mix_k1(input));
    fmix(h1, 4)
}

/// Hash a 64-bit integer.
pub fn integer(input: i64) -> u32 {
    if input == 0 {
        return 0;
    }
    let bits = input as u64;
    let low = bits as u32;
    let high = (bits >> 32) as u32;

    let mut h1 = mix_h1(SEED, mix_k1(low));
    h1 = mix_h1(h1, mix_k1(high));
    fmix(h1, 8)
}

/// Hash a real number by its bit pattern.
pub fn real(input: f64) -> u32 {
    integer(input.to_bits() as i64)
}

/// Hash a pointer-sized address (used for identity-compared values).
pub fn address(addr: usize) -> u32 {
    integer(addr as i64)
}

/// Hash a string by its UTF-8 bytes, four at a time.
pub fn string(input: &str) -> u32 {
    let bytes = input.as_bytes();
    let mut h1 = SEED;

    let mut chunks = bytes.chunks_exact(4);
    for chunk in &mut chunks {
        let k1 = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        h1 = mix_h1(h1, mix_k1(k1));
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k1 = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k1 |= (*byte as u32) << (8 * i);
        }
        h1 ^= mix_k1(k1);
    }

    fmix(h1, bytes.len() as u32)
}

/// Combine a seed with another hash (boost-style).
#[inline]
pub fn combine(seed: u32, hash: u32) -> u32 {
    seed ^ hash
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// Final mixing step shared by ordered and unordered collection hashes.
#[inline]
pub fn mix_collection_hash(hash: u32, count: u32) -> u32 {
    let h1 = mix_h1(SEED, mix_k1(hash));
    fmix(h1, count)
}

/// Position-dependent combination of element hashes.
pub fn ordered<I>(hashes: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let mut hash = 1u32;
    let mut count = 0u32;
    for h in hashes {
        hash = hash.wrapping_mul(31).wrapping_add(h);
        count = count.wrapping_add(1);
    }
    mix_collection_hash(hash, count)
}

/// Order-independent combination of element hashes.
pub fn unordered<I>(hashes: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let mut hash = 0u32;
    let mut count = 0u32;
    for h in hashes {
        hash = hash.wrapping_add(h);
        count = count.wrapping_add(1);
    }
    mix_collection_hash(hash, count)
}

/// Hash of a single map entry, shared by every map representation.
#[inline]
pub fn map_entry(key: u32, value: u32) -> u32 {
    ordered([key, value])
}
