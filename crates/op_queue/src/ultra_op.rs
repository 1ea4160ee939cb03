//! A single entry of the ECC operation log as seen by circuits over Fr.
//!
//! Point coordinates live in Fq and do not fit into one Fr element, so each
//! coordinate is carried as a low half of 136 bits and a high half of the
//! remaining 118 bits.

use bbrs_ecc::{Fq, Fr};
use bbrs_numeric::{U256, U256Ext};

/// Bit position at which coordinates are split into `*_lo` / `*_hi`.
pub const COORDINATE_SPLIT_BITS: u32 = 136;

/// Width of the high half of a coordinate (Fq modulus fits in 254 bits).
pub const COORDINATE_HIGH_BITS: u32 = 118;

/// Width of the scalar halves `z_1` / `z_2`.
pub const Z_SCALAR_BITS: u32 = 128;

/// Bit flags describing what an operation does. The encoded value is
/// `add·8 + mul·4 + eq·2 + reset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EccOpCode {
    pub add: bool,
    pub mul: bool,
    pub eq: bool,
    pub reset: bool,
}

impl EccOpCode {
    pub const NO_OP: Self = Self { add: false, mul: false, eq: false, reset: false };
    pub const ADD: Self = Self { add: true, mul: false, eq: false, reset: false };
    pub const MUL: Self = Self { add: false, mul: true, eq: false, reset: false };
    pub const EQ_AND_RESET: Self = Self { add: false, mul: false, eq: true, reset: true };

    /// Encoded values an op-log entry may carry.
    pub const VALID_VALUES: [u32; 6] = [0, 1, 2, 3, 4, 8];

    pub fn value(&self) -> u32 {
        (self.add as u32) << 3 | (self.mul as u32) << 2 | (self.eq as u32) << 1 | self.reset as u32
    }

    /// Decode a value from [`Self::VALID_VALUES`]. Other combinations are rejected.
    pub fn from_value(value: u32) -> Option<Self> {
        if !Self::VALID_VALUES.contains(&value) {
            return None;
        }
        Some(Self { add: value & 8 != 0, mul: value & 4 != 0, eq: value & 2 != 0, reset: value & 1 != 0 })
    }

    pub fn is_no_op(&self) -> bool {
        self.value() == 0
    }
}

/// Affine point over Fq, or the point at infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: Fq,
    pub y: Fq,
    pub is_point_at_infinity: bool,
}

impl AffinePoint {
    pub fn new(x: Fq, y: Fq) -> Self {
        Self { x, y, is_point_at_infinity: false }
    }

    pub fn infinity() -> Self {
        Self { x: Fq::zero(), y: Fq::zero(), is_point_at_infinity: true }
    }
}

/// One operation-log entry with its coordinates split into Fr-sized halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UltraOp {
    pub op_code: EccOpCode,
    pub x_lo: Fr,
    pub x_hi: Fr,
    pub y_lo: Fr,
    pub y_hi: Fr,
    pub z_1: Fr,
    pub z_2: Fr,
    pub return_is_infinity: bool,
}

/// Split a coordinate at [`COORDINATE_SPLIT_BITS`] into (lo, hi).
fn split_coordinate(coordinate: &Fq) -> (Fr, Fr) {
    let value = coordinate.to_u256();
    (
        Fr::from_u256(value.slice(0, COORDINATE_SPLIT_BITS)),
        Fr::from_u256(value.slice(COORDINATE_SPLIT_BITS, U256::BITS)),
    )
}

impl UltraOp {
    pub fn new(op_code: EccOpCode, point: AffinePoint, z_1: u128, z_2: u128) -> Self {
        let (x_lo, x_hi, y_lo, y_hi) = if point.is_point_at_infinity {
            (Fr::zero(), Fr::zero(), Fr::zero(), Fr::zero())
        } else {
            let (x_lo, x_hi) = split_coordinate(&point.x);
            let (y_lo, y_hi) = split_coordinate(&point.y);
            (x_lo, x_hi, y_lo, y_hi)
        };
        Self {
            op_code,
            x_lo,
            x_hi,
            y_lo,
            y_hi,
            z_1: Fr::from_u128(z_1),
            z_2: Fr::from_u128(z_2),
            return_is_infinity: point.is_point_at_infinity,
        }
    }

    /// An entry that contributes nothing but still occupies a gate.
    pub fn no_op() -> Self {
        Self::new(EccOpCode::NO_OP, AffinePoint::infinity(), 0, 0)
    }

    /// Recombine the coordinate halves into Fq: `x_lo + x_hi·2^136`, and the
    /// same for y. Returns (0, 0) when the entry encodes the point at infinity.
    pub fn get_base_point_standard_form(&self) -> (Fq, Fq) {
        if self.return_is_infinity {
            return (Fq::zero(), Fq::zero());
        }
        let recombine = |lo: &Fr, hi: &Fr| {
            let value = hi.to_u256().wrapping_shl_vartime(COORDINATE_SPLIT_BITS).wrapping_add(&lo.to_u256());
            Fq::from_u256(value)
        };
        (recombine(&self.x_lo, &self.x_hi), recombine(&self.y_lo, &self.y_hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbrs_numeric::random::DebugRng;

    #[test]
    fn op_code_values() {
        assert_eq!(EccOpCode::NO_OP.value(), 0);
        assert_eq!(EccOpCode::EQ_AND_RESET.value(), 3);
        assert_eq!(EccOpCode::MUL.value(), 4);
        assert_eq!(EccOpCode::ADD.value(), 8);
        for value in EccOpCode::VALID_VALUES {
            let decoded = EccOpCode::from_value(value).unwrap();
            assert_eq!(decoded.value(), value);
        }
        assert_eq!(EccOpCode::from_value(5), None);
        assert_eq!(EccOpCode::from_value(12), None);
        assert!(EccOpCode::default().is_no_op());
    }

    #[test]
    fn coordinates_split_and_recombine() {
        let mut rng = DebugRng::new(11);
        for _ in 0..16 {
            let point = AffinePoint::new(Fq::random_element_with(&mut rng), Fq::random_element_with(&mut rng));
            let op = UltraOp::new(EccOpCode::MUL, point, rng.get_random_u128(), rng.get_random_u128());
            assert!(op.x_lo.to_u256().fits_in_bits(COORDINATE_SPLIT_BITS));
            assert!(op.y_lo.to_u256().fits_in_bits(COORDINATE_SPLIT_BITS));
            assert!(op.x_hi.to_u256().fits_in_bits(COORDINATE_HIGH_BITS));
            assert!(op.y_hi.to_u256().fits_in_bits(COORDINATE_HIGH_BITS));
            assert_eq!(op.get_base_point_standard_form(), (point.x, point.y));
        }
    }

    #[test]
    fn scalars_are_carried_exactly() {
        let op = UltraOp::new(EccOpCode::MUL, AffinePoint::new(Fq::one(), Fq::from(2)), u128::MAX, 7);
        assert_eq!(op.z_1.to_u256(), U256::from_u128(u128::MAX));
        assert_eq!(op.z_2, Fr::from(7));
    }

    #[test]
    fn infinity_maps_to_zero_coordinates() {
        let op = UltraOp::new(EccOpCode::EQ_AND_RESET, AffinePoint::infinity(), 0, 0);
        assert!(op.return_is_infinity);
        assert!(op.x_lo.is_zero() && op.x_hi.is_zero() && op.y_lo.is_zero() && op.y_hi.is_zero());
        assert_eq!(op.get_base_point_standard_form(), (Fq::zero(), Fq::zero()));
    }

    #[test]
    fn no_op_is_all_zero() {
        let op = UltraOp::no_op();
        assert_eq!(op.op_code.value(), 0);
        assert!(op.z_1.is_zero() && op.z_2.is_zero());
    }
}
