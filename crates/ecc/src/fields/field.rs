use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use bbrs_numeric::{U256, U256Ext, U512, U512Ext};
use rand::Rng;

use super::field_params::FieldParams;

// ---------------------------------------------------------------------------
// Word helpers
// ---------------------------------------------------------------------------

/// Multiply-accumulate: a + b*c + carry_in -> (result, carry_out).
#[inline(always)]
const fn mac(a: u64, b: u64, c: u64, carry_in: u64) -> (u64, u64) {
    let res = a as u128 + (b as u128 * c as u128) + carry_in as u128;
    (res as u64, (res >> 64) as u64)
}

/// Add with carry: a + b + carry_in -> (result, carry_out).
#[inline(always)]
const fn addc(a: u64, b: u64, carry_in: u64) -> (u64, u64) {
    let res = a as u128 + b as u128 + carry_in as u128;
    (res as u64, (res >> 64) as u64)
}

// ---------------------------------------------------------------------------
// Field element
// ---------------------------------------------------------------------------

/// Element of the prime field described by `P`, stored in Montgomery form.
///
/// The stored value is always fully reduced (`< p`), so equality is a plain
/// comparison of the stored words.
pub struct Field<P: FieldParams> {
    data: U256,
    _params: PhantomData<P>,
}

impl<P: FieldParams> Clone for Field<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: FieldParams> Copy for Field<P> {}

impl<P: FieldParams> std::fmt::Debug for Field<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.to_u256())
    }
}

impl<P: FieldParams> Default for Field<P> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<P: FieldParams> Field<P> {
    pub const MODULUS: U256 = U256::from_words(P::MODULUS);

    #[inline]
    const fn from_montgomery_words(data: U256) -> Self {
        Self { data, _params: PhantomData }
    }

    pub fn zero() -> Self {
        Self::from_montgomery_words(U256::ZERO)
    }

    pub fn one() -> Self {
        Self::from_u256(U256::ONE)
    }

    pub fn from(val: u64) -> Self {
        Self::from_u256(U256::from_u64(val))
    }

    pub fn from_u128(val: u128) -> Self {
        Self::from_u256(U256::from_u128(val))
    }

    /// Convert a standard-form integer. Values `>= p` are reduced.
    pub fn from_u256(val: U256) -> Self {
        let reduced = if val >= Self::MODULUS { Self::reduce_u512(U512::from_u256(val)) } else { val };
        let r_squared = U256::from_words(P::R_SQUARED);
        Self::from_montgomery_words(Self::montgomery_mul(&reduced, &r_squared))
    }

    /// Construct from standard-form limbs (little-endian).
    pub fn from_limbs(limbs: [u64; 4]) -> Self {
        Self::from_u256(U256::from_limbs(limbs))
    }

    /// Reduce an arbitrary 512-bit integer into the field.
    pub fn from_u512(val: U512) -> Self {
        Self::from_u256(Self::reduce_u512(val))
    }

    /// The canonical integer representative in `[0, p)`.
    pub fn to_u256(&self) -> U256 {
        Self::montgomery_mul(&self.data, &U256::ONE)
    }

    pub fn is_zero(&self) -> bool {
        self.data == U256::ZERO
    }

    pub fn sqr(&self) -> Self {
        *self * *self
    }

    pub fn negate(&self) -> Self {
        if self.is_zero() {
            return *self;
        }
        Self::from_montgomery_words(Self::MODULUS.wrapping_sub(&self.data))
    }

    /// `self^exp` by square-and-multiply over the bits of `exp`.
    pub fn pow(&self, exp: &U256) -> Self {
        let mut acc = Self::one();
        if *exp == U256::ZERO {
            return acc;
        }
        for bit in (0..=exp.get_msb()).rev() {
            acc = acc.sqr();
            if exp.get_bit(bit) {
                acc *= *self;
            }
        }
        acc
    }

    pub fn pow_u64(&self, exp: u64) -> Self {
        self.pow(&U256::from_u64(exp))
    }

    /// Multiplicative inverse via Fermat's little theorem. The inverse of zero is zero.
    pub fn invert(&self) -> Self {
        self.pow(&Self::MODULUS.wrapping_sub(&U256::from_u64(2)))
    }

    /// Uniformly random element from OS entropy.
    pub fn random_element() -> Self {
        Self::random_element_with(&mut rand::rng())
    }

    /// Uniformly random element drawn from `rng`, reducing 512 random bits.
    pub fn random_element_with<R: Rng>(rng: &mut R) -> Self {
        let mut words = [0u64; 8];
        for word in words.iter_mut() {
            *word = rng.random();
        }
        Self::from_u512(U512::from_words(words))
    }

    fn reduce_u512(val: U512) -> U256 {
        let modulus = U512::from_u256(Self::MODULUS)
            .to_nz()
            .expect("modulus is nonzero");
        val.rem(&modulus).lo()
    }

    /// Montgomery product `a * b * R^{-1} mod p` (CIOS), inputs reduced.
    fn montgomery_mul(a: &U256, b: &U256) -> U256 {
        let p = P::MODULUS;
        let a = a.as_words();
        let b = b.as_words();
        let mut t = [0u64; 6];
        for i in 0..4 {
            let mut carry = 0u64;
            for j in 0..4 {
                (t[j], carry) = mac(t[j], a[j], b[i], carry);
            }
            (t[4], t[5]) = addc(t[4], carry, 0);

            let m = t[0].wrapping_mul(P::R_INV);
            let (_, mut carry) = mac(t[0], m, p[0], 0);
            for j in 1..4 {
                (t[j - 1], carry) = mac(t[j], m, p[j], carry);
            }
            let (sum, overflow) = addc(t[4], carry, 0);
            t[3] = sum;
            t[4] = t[5] + overflow;
        }
        debug_assert_eq!(t[4], 0, "montgomery product exceeded 256 bits");
        let result = U256::from_words([t[0], t[1], t[2], t[3]]);
        if result >= Self::MODULUS { result.wrapping_sub(&Self::MODULUS) } else { result }
    }
}

// ---------------------------------------------------------------------------
// Operator traits
// ---------------------------------------------------------------------------

impl<P: FieldParams> Add for Field<P> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        // p < 2^255, so the sum cannot wrap
        let sum = self.data.wrapping_add(&rhs.data);
        let sum = if sum >= Self::MODULUS { sum.wrapping_sub(&Self::MODULUS) } else { sum };
        Self::from_montgomery_words(sum)
    }
}

impl<P: FieldParams> AddAssign for Field<P> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<P: FieldParams> Sub for Field<P> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let diff = if self.data >= rhs.data {
            self.data.wrapping_sub(&rhs.data)
        } else {
            Self::MODULUS.wrapping_sub(&rhs.data).wrapping_add(&self.data)
        };
        Self::from_montgomery_words(diff)
    }
}

impl<P: FieldParams> SubAssign for Field<P> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<P: FieldParams> Mul for Field<P> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_montgomery_words(Self::montgomery_mul(&self.data, &rhs.data))
    }
}

impl<P: FieldParams> MulAssign for Field<P> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<P: FieldParams> Neg for Field<P> {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl<P: FieldParams> Sum for Field<P> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl<P: FieldParams> PartialEq for Field<P> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<P: FieldParams> Eq for Field<P> {}
