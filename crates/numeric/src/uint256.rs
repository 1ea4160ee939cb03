// 256-bit unsigned integer type.
//
// `crypto_bigint::U256` stores 4 x u64 words in little-endian word order
// (word 0 is least significant). The extension trait adds the bit-window
// helpers the limb codecs are written in terms of.

use crypto_bigint::Uint;

/// 256-bit unsigned integer, backed by `crypto_bigint::U256`.
pub type U256 = Uint<4>;

/// Bit-window extension methods for U256.
pub trait U256Ext: Sized {
    /// Position of the most significant set bit (0-indexed). Returns 0 for zero.
    fn get_msb(&self) -> u32;

    fn get_bit(&self, index: u32) -> bool;

    /// `2^bits`. Panics if `bits >= 256`.
    fn pow2(bits: u32) -> Self;

    /// All-ones value of the given bit width (`2^bits - 1`).
    fn mask(bits: u32) -> Self;

    /// Extract the bit range `[start, end)` as a value of the same width.
    fn slice(&self, start: u32, end: u32) -> Self;

    /// Extract the bit range `[start, end)` as a u64. The range must fit in 64 bits.
    fn slice_u64(&self, start: u32, end: u32) -> u64;

    /// True if the value is strictly below `2^bits`.
    fn fits_in_bits(&self, bits: u32) -> bool;

    fn from_limbs(limbs: [u64; 4]) -> Self;

    fn limbs(&self) -> [u64; 4];
}

impl U256Ext for U256 {
    fn get_msb(&self) -> u32 {
        let bits = self.bits_vartime();
        if bits == 0 { 0 } else { bits - 1 }
    }

    fn get_bit(&self, index: u32) -> bool {
        self.bit_vartime(index)
    }

    fn pow2(bits: u32) -> Self {
        assert!(bits < U256::BITS, "2^{bits} does not fit in 256 bits");
        U256::ONE.wrapping_shl_vartime(bits)
    }

    fn mask(bits: u32) -> Self {
        if bits == 0 {
            return U256::ZERO;
        }
        if bits >= U256::BITS {
            return U256::MAX;
        }
        U256::MAX.wrapping_shr_vartime(U256::BITS - bits)
    }

    fn slice(&self, start: u32, end: u32) -> Self {
        assert!(end > start, "end must be greater than start");
        self.wrapping_shr_vartime(start).bitand(&U256::mask(end - start))
    }

    fn slice_u64(&self, start: u32, end: u32) -> u64 {
        assert!(end - start <= 64, "slice range must fit in u64");
        self.slice(start, end).as_words()[0]
    }

    fn fits_in_bits(&self, bits: u32) -> bool {
        self.bits_vartime() <= bits
    }

    fn from_limbs(limbs: [u64; 4]) -> Self {
        U256::from_words(limbs)
    }

    fn limbs(&self) -> [u64; 4] {
        *self.as_words()
    }
}
