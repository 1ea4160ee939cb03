// 512-bit unsigned integer type.
//
// Products of two 256-bit values and sums of a handful of such products
// fit comfortably below 2^512, so exact (non-modular) bookkeeping over
// 254-bit field elements is done in this width.

use crypto_bigint::Uint;

use crate::uint256::{U256, U256Ext};

/// 512-bit unsigned integer.
pub type U512 = Uint<8>;

/// Extension methods for U512.
pub trait U512Ext {
    /// Low 256 bits.
    fn lo(&self) -> U256;

    /// High 256 bits.
    fn hi(&self) -> U256;

    /// Zero-extend a 256-bit value.
    fn from_u256(value: U256) -> Self;

    /// `2^bits`. Panics if `bits >= 512`.
    fn pow2(bits: u32) -> Self;

    /// Extract the bit range `[start, end)`; the range must fit in 256 bits.
    fn slice_u256(&self, start: u32, end: u32) -> U256;
}

impl U512Ext for U512 {
    fn lo(&self) -> U256 {
        let (lo, _hi) = self.split();
        lo
    }

    fn hi(&self) -> U256 {
        let (_lo, hi) = self.split();
        hi
    }

    fn from_u256(value: U256) -> Self {
        value.concat(&U256::ZERO)
    }

    fn pow2(bits: u32) -> Self {
        assert!(bits < U512::BITS, "2^{bits} does not fit in 512 bits");
        U512::ONE.wrapping_shl_vartime(bits)
    }

    fn slice_u256(&self, start: u32, end: u32) -> U256 {
        assert!(end > start, "end must be greater than start");
        assert!(end - start <= U256::BITS, "slice range must fit in 256 bits");
        self.wrapping_shr_vartime(start).lo().bitand(&U256::mask(end - start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lo_hi_roundtrip() {
        let lo = U256::from_limbs([1, 2, 3, 4]);
        let hi = U256::from_limbs([5, 6, 7, 8]);
        let wide: U512 = lo.concat(&hi);
        assert_eq!(wide.lo(), lo);
        assert_eq!(wide.hi(), hi);
    }

    #[test]
    fn widened_product_is_exact() {
        let a = U512::from_u256(U256::MAX);
        let b = U512::from_u256(U256::from_u64(2));
        let wide = a.wrapping_mul(&b);
        // (2^256 - 1) * 2 = 2^257 - 2
        assert_eq!(wide.hi(), U256::ONE);
        assert_eq!(wide.lo(), U256::from_limbs([u64::MAX - 1, u64::MAX, u64::MAX, u64::MAX]));
    }

    #[test]
    fn slice_across_the_halves() {
        let wide: U512 = U256::from_limbs([0, 0, 0, 0xdead << 48]).concat(&U256::from_limbs([0xbeef, 0, 0, 0]));
        assert_eq!(wide.slice_u256(240, 272), U256::from_u64(0xbeef_dead));
    }

    #[test]
    fn division_matches_small_integers() {
        let a = U512::from_u256(U256::from_u64(100));
        let b = U512::from_u256(U256::from_u64(7));
        let (q, r) = a.div_rem(&b.to_nz().unwrap());
        assert_eq!(q.lo(), U256::from_u64(14));
        assert_eq!(r.lo(), U256::from_u64(2));
    }

    #[test]
    fn pow2_matches_shift_of_u256() {
        assert_eq!(U512::pow2(200).lo(), U256::pow2(200));
        assert_eq!(U512::pow2(272).hi(), U256::pow2(16));
    }
}
