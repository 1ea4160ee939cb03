//! Limb and microlimb codecs.
//!
//! Binary limbs carry a non-native value in base 2^68 as Fr elements.
//! Microlimbs carry a single binary limb as 14-bit chunks so that every
//! range check reduces to the same 14-bit lookup. When the top chunk of a
//! limb is narrower than 14 bits, it is repeated in the next slot shifted up
//! to the 14-bit boundary (the "tail"); bounding the tail by 2^14 then bounds
//! the top chunk by its true width.

use bbrs_ecc::{Fq, Fr};
use bbrs_numeric::bitop::ceil_div;
use bbrs_numeric::{U256, U256Ext, U512, U512Ext};

use crate::constants::{
    constants, MICRO_LIMB_BITS, NUM_BINARY_LIMBS, NUM_CHALLENGE_LIMBS, NUM_LIMB_BITS, NUM_MICRO_LIMBS, NUM_Z_LIMBS,
    RELATION_WIDE_LIMB_BITS,
};

// ---------------------------------------------------------------------------
// Binary limbs
// ---------------------------------------------------------------------------

fn slice_limb(value: &U256, index: usize) -> Fr {
    let start = index as u32 * NUM_LIMB_BITS;
    Fr::from_u256(value.slice(start, start + NUM_LIMB_BITS))
}

/// Split an integer below 2^272 into four 68-bit binary limbs.
pub fn split_u256_into_limbs(value: &U256) -> [Fr; NUM_BINARY_LIMBS] {
    std::array::from_fn(|i| slice_limb(value, i))
}

/// Split an Fq element into its four binary limbs (68/68/68/50 bits).
pub fn split_fq_into_limbs(value: &Fq) -> [Fr; NUM_BINARY_LIMBS] {
    split_u256_into_limbs(&value.to_u256())
}

/// Split a 512-bit integer that is known to be below 2^256.
pub fn split_u512_into_limbs(value: &U512) -> [Fr; NUM_BINARY_LIMBS] {
    debug_assert_eq!(value.hi(), U256::ZERO, "value does not fit in four limbs");
    split_u256_into_limbs(&value.lo())
}

/// Split a value of up to 136 bits into a low 68-bit limb and the remainder.
pub fn split_wide_limb_into_2_limbs(value: &Fr) -> [Fr; NUM_Z_LIMBS] {
    let value = value.to_u256();
    debug_assert!(value.fits_in_bits(2 * NUM_LIMB_BITS), "wide limb exceeds 136 bits");
    [slice_limb(&value, 0), slice_limb(&value, 1)]
}

/// Σ limb_i · 2^(68·i) over the integers.
pub fn recompose_limbs(limbs: &[Fr]) -> U512 {
    limbs.iter().enumerate().fold(U512::ZERO, |acc, (i, limb)| {
        let shifted = U512::from_u256(limb.to_u256()).wrapping_shl_vartime(i as u32 * NUM_LIMB_BITS);
        acc.wrapping_add(&shifted)
    })
}

/// Σ limb_i · 2^(68·i) evaluated in Fr.
pub fn recompose_limbs_native(limbs: &[Fr]) -> Fr {
    let c = constants();
    let shifts = [Fr::one(), c.shift_1, c.shift_2, c.shift_3];
    limbs.iter().zip(shifts).map(|(limb, shift)| *limb * shift).sum()
}

/// Recompose four binary limbs into an Fq element.
pub fn fq_from_limbs(limbs: &[Fr; NUM_BINARY_LIMBS]) -> Fq {
    Fq::from_u512(recompose_limbs(limbs))
}

/// Binary limbs of a challenge followed by the challenge reduced mod r.
pub fn split_challenge_into_limbs(value: &Fq) -> [Fr; NUM_CHALLENGE_LIMBS] {
    let integer = value.to_u256();
    let [l0, l1, l2, l3] = split_u256_into_limbs(&integer);
    [l0, l1, l2, l3, Fr::from_u256(integer)]
}

// ---------------------------------------------------------------------------
// Microlimbs
// ---------------------------------------------------------------------------

/// Where the shifted copy of the top chunk goes and how far it is shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroLimbTail {
    pub index: usize,
    pub shift: u32,
}

/// How a limb of a given width is laid out across the six microlimb slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroLimbLayout {
    pub width: u32,
    /// Number of 14-bit chunks holding the value itself.
    pub chunks: usize,
    pub tail: Option<MicroLimbTail>,
}

impl MicroLimbLayout {
    /// Panics if a limb of `width` bits cannot be carried in six slots.
    pub fn for_width(width: u32) -> Self {
        assert!(width > 0, "limb width must be positive");
        let chunks = ceil_div(width, MICRO_LIMB_BITS) as usize;
        let top_chunk_bits = width - (chunks as u32 - 1) * MICRO_LIMB_BITS;
        let tail = (top_chunk_bits < MICRO_LIMB_BITS)
            .then(|| MicroLimbTail { index: chunks, shift: MICRO_LIMB_BITS - top_chunk_bits });
        let used = chunks + tail.map_or(0, |_| 1);
        assert!(used <= NUM_MICRO_LIMBS, "a {width}-bit limb needs {used} microlimb slots");
        Self { width, chunks, tail }
    }

    /// Number of slots the layout occupies; the rest stay zero.
    pub fn used_slots(&self) -> usize {
        self.chunks + self.tail.map_or(0, |_| 1)
    }
}

/// Split a limb of at most `width` bits into six microlimbs.
///
/// Slots `0..chunks` hold the 14-bit chunks, the tail slot (if any) holds
/// the top chunk shifted to the 14-bit boundary, and remaining slots are zero.
/// Panics if `limb >= 2^width`.
pub fn split_limb_into_micro_limbs(limb: &Fr, width: u32) -> [Fr; NUM_MICRO_LIMBS] {
    let layout = MicroLimbLayout::for_width(width);
    let value = limb.to_u256();
    assert!(value.fits_in_bits(width), "limb {limb:?} does not fit in {width} bits");

    let mut micro_limbs = [Fr::zero(); NUM_MICRO_LIMBS];
    for (i, slot) in micro_limbs.iter_mut().take(layout.chunks).enumerate() {
        let start = i as u32 * MICRO_LIMB_BITS;
        *slot = Fr::from(value.slice_u64(start, start + MICRO_LIMB_BITS));
    }
    if let Some(tail) = layout.tail {
        let top = micro_limbs[layout.chunks - 1].to_u256();
        micro_limbs[tail.index] = Fr::from_u256(top.wrapping_shl_vartime(tail.shift));
    }
    micro_limbs
}

/// Split an 84-bit relation-wide limb into six 14-bit microlimbs.
pub fn split_relation_limb_into_micro_limbs(limb: &Fr) -> [Fr; NUM_MICRO_LIMBS] {
    split_limb_into_micro_limbs(limb, RELATION_WIDE_LIMB_BITS)
}

/// Σ micro_i · 2^(14·i) over the first `chunks` slots, in Fr.
pub fn recompose_micro_limbs(micro_limbs: &[Fr], chunks: usize) -> Fr {
    let c = constants();
    micro_limbs.iter().zip(c.micro_shifts).take(chunks).map(|(micro, shift)| *micro * shift).sum()
}
