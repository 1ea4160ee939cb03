//! Widths and precomputed values shared by witness generation, validation and
//! the circuit checker.
//!
//! An Fq element is carried as four binary limbs of 68/68/68/50 bits; every
//! binary limb is in turn carried as six microlimbs of at most 14 bits. The
//! quotient of the modular reduction is up to 256 bits (top limb 52 bits), z
//! scalars are 128 bits (two limbs of 68/60 bits), and the reduction identity
//! modulo 2^272 is certified by two relation-wide limbs of 84 bits.

use std::sync::LazyLock;

use bbrs_ecc::{Fq, Fr};
use bbrs_numeric::{U256, U256Ext, U512, U512Ext};
use crypto_bigint::NonZero;

/// Number of wire columns in the translator trace.
pub const NUM_WIRES: usize = 81;

/// Default row capacity of the trace (the "minicircuit").
pub const DEFAULT_TRANSLATOR_VM_LENGTH: usize = 2048;

/// Rows occupied by one accumulation gate.
pub const ROWS_PER_GATE: usize = 2;

/// All-zero rows placed at the start of a non-empty trace.
pub const NUM_PADDING_ROWS: usize = 2;

/// Row holding the current accumulator of the last accumulation step.
pub const RESULT_ROW: usize = NUM_PADDING_ROWS;

pub const NUM_BINARY_LIMBS: usize = 4;
pub const NUM_MICRO_LIMBS: usize = 6;
pub const NUM_Z_LIMBS: usize = 2;
pub const NUM_RELATION_WIDE_LIMBS: usize = 2;

/// Limbs of a challenge: the four binary limbs plus the value reduced mod r.
pub const NUM_CHALLENGE_LIMBS: usize = NUM_BINARY_LIMBS + 1;

pub const NUM_LIMB_BITS: u32 = 68;

/// Width of the top limb of an Fq element: msb(q) + 1 - 3·68.
pub const NUM_LAST_LIMB_BITS: u32 = 50;

pub const NUM_QUOTIENT_BITS: u32 = 256;
pub const NUM_LAST_QUOTIENT_LIMB_BITS: u32 = NUM_QUOTIENT_BITS - 3 * NUM_LIMB_BITS;

pub const NUM_Z_BITS: u32 = 128;
pub const NUM_LAST_Z_LIMB_BITS: u32 = NUM_Z_BITS - NUM_LIMB_BITS;

pub const MICRO_LIMB_BITS: u32 = 14;
pub const RELATION_WIDE_LIMB_BITS: u32 = 84;

/// Width of one half of the 2^272 check.
pub const HALF_RELATION_BITS: u32 = 2 * NUM_LIMB_BITS;

/// Binary limb widths of an Fq element (coordinates, accumulators).
pub const FQ_LIMB_WIDTHS: [u32; NUM_BINARY_LIMBS] =
    [NUM_LIMB_BITS, NUM_LIMB_BITS, NUM_LIMB_BITS, NUM_LAST_LIMB_BITS];

/// Binary limb widths of the quotient.
pub const QUOTIENT_LIMB_WIDTHS: [u32; NUM_BINARY_LIMBS] =
    [NUM_LIMB_BITS, NUM_LIMB_BITS, NUM_LIMB_BITS, NUM_LAST_QUOTIENT_LIMB_BITS];

/// Limb widths of a z scalar.
pub const Z_LIMB_WIDTHS: [u32; NUM_Z_LIMBS] = [NUM_LIMB_BITS, NUM_LAST_Z_LIMB_BITS];

/// Values derived from the field moduli, computed once per process.
#[derive(Debug)]
pub struct TranslatorConstants {
    /// 2^68 in Fr.
    pub shift_1: Fr,
    /// 2^136 in Fr.
    pub shift_2: Fr,
    /// (2^136)^-1 in Fr.
    pub shift_2_inverse: Fr,
    /// 2^204 in Fr.
    pub shift_3: Fr,
    /// 2^(14·i) in Fr for each microlimb position.
    pub micro_shifts: [Fr; NUM_MICRO_LIMBS],
    /// Base-2^68 limbs of 2^272 - q, followed by -q mod r.
    pub negative_modulus_limbs: [Fr; NUM_CHALLENGE_LIMBS],
    /// q as a 512-bit integer.
    pub modulus_u512: U512,
    pub modulus_nonzero: NonZero<U512>,
    /// 2^272
    pub binary_basis_modulus: U512,
    /// 2^272 - q
    pub negative_prime_modulus: U512,
}

impl TranslatorConstants {
    fn compute() -> Self {
        let shift = |bits: u32| Fr::from_u256(U256::pow2(bits));
        let shift_2 = shift(HALF_RELATION_BITS);

        let modulus_u512 = U512::from_u256(Fq::MODULUS);
        let binary_basis_modulus = U512::pow2(NUM_BINARY_LIMBS as u32 * NUM_LIMB_BITS);
        let negative_prime_modulus = binary_basis_modulus.wrapping_sub(&modulus_u512);
        let negative_modulus_limbs = [
            Fr::from_u256(negative_prime_modulus.slice_u256(0, NUM_LIMB_BITS)),
            Fr::from_u256(negative_prime_modulus.slice_u256(NUM_LIMB_BITS, 2 * NUM_LIMB_BITS)),
            Fr::from_u256(negative_prime_modulus.slice_u256(2 * NUM_LIMB_BITS, 3 * NUM_LIMB_BITS)),
            Fr::from_u256(negative_prime_modulus.slice_u256(3 * NUM_LIMB_BITS, 4 * NUM_LIMB_BITS)),
            -Fr::from_u256(Fq::MODULUS),
        ];

        Self {
            shift_1: shift(NUM_LIMB_BITS),
            shift_2,
            shift_2_inverse: shift_2.invert(),
            shift_3: shift(3 * NUM_LIMB_BITS),
            micro_shifts: std::array::from_fn(|i| shift(i as u32 * MICRO_LIMB_BITS)),
            negative_modulus_limbs,
            modulus_u512,
            modulus_nonzero: NonZero::new(modulus_u512).expect("modulus is nonzero"),
            binary_basis_modulus,
            negative_prime_modulus,
        }
    }
}

static CONSTANTS: LazyLock<TranslatorConstants> = LazyLock::new(TranslatorConstants::compute);

/// The process-wide constant table.
#[inline]
pub fn constants() -> &'static TranslatorConstants {
    &CONSTANTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_limb_width_matches_modulus() {
        assert_eq!(Fq::MODULUS.get_msb() + 1 - 3 * NUM_LIMB_BITS, NUM_LAST_LIMB_BITS);
        assert_eq!(NUM_LAST_QUOTIENT_LIMB_BITS, 52);
        assert_eq!(NUM_LAST_Z_LIMB_BITS, 60);
    }

    #[test]
    fn wide_limbs_have_room_for_half_relations() {
        // Each half sums products of 68-bit limbs; the carry out of 2^136 must fit 84 bits,
        // and 84 bits is exactly six microlimbs.
        assert_eq!(RELATION_WIDE_LIMB_BITS, NUM_MICRO_LIMBS as u32 * MICRO_LIMB_BITS);
        assert!(NUM_LAST_LIMB_BITS + MICRO_LIMB_BITS <= NUM_LIMB_BITS);
    }

    #[test]
    fn shifts_are_consistent() {
        let c = constants();
        assert_eq!(c.shift_1 * c.shift_1, c.shift_2);
        assert_eq!(c.shift_2 * c.shift_1, c.shift_3);
        assert_eq!(c.shift_2 * c.shift_2_inverse, Fr::one());
        assert_eq!(c.micro_shifts[0], Fr::one());
        assert_eq!(c.micro_shifts[5], Fr::from_u256(U256::pow2(70)));
    }

    #[test]
    fn negative_modulus_limbs_recompose() {
        let c = constants();
        let recomposed = c.negative_modulus_limbs[0]
            + c.negative_modulus_limbs[1] * c.shift_1
            + c.negative_modulus_limbs[2] * c.shift_2
            + c.negative_modulus_limbs[3] * c.shift_3;
        assert_eq!(recomposed, Fr::from_u512(c.negative_prime_modulus));
        assert_eq!(c.negative_modulus_limbs[4] + Fr::from_u256(Fq::MODULUS), Fr::zero());
        assert_eq!(c.negative_prime_modulus.wrapping_add(&c.modulus_u512), c.binary_basis_modulus);
    }
}
