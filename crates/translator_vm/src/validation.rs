//! Well-formedness checks for op-log entries and accumulation witnesses.
//!
//! Every check here is redundant with the circuit's own constraints; it
//! exists to catch a bad witness at construction time, next to the entry that
//! produced it, instead of as an unsatisfiable proof later.

use std::fmt;

use bbrs_ecc::{Fq, Fr};
use bbrs_numeric::{U256Ext, U512, U512Ext};
use bbrs_op_queue::ultra_op::{COORDINATE_HIGH_BITS, COORDINATE_SPLIT_BITS, Z_SCALAR_BITS};
use bbrs_op_queue::{EccOpCode, UltraOp};
use thiserror::Error;

use crate::constants::{
    constants, FQ_LIMB_WIDTHS, MICRO_LIMB_BITS, NUM_MICRO_LIMBS, QUOTIENT_LIMB_WIDTHS, RELATION_WIDE_LIMB_BITS,
    Z_LIMB_WIDTHS,
};
use crate::limbs::{recompose_limbs, recompose_micro_limbs, MicroLimbLayout};
use crate::relation::TranslationChallenges;
use crate::witness::AccumulationInput;

/// Whether witnesses are checked before they are laid into the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessValidation {
    Full,
    Skip,
}

impl WitnessValidation {
    pub fn is_enabled(self) -> bool {
        self == WitnessValidation::Full
    }
}

impl Default for WitnessValidation {
    /// Full in debug builds, skipped in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) { WitnessValidation::Full } else { WitnessValidation::Skip }
    }
}

/// Which value a limb belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimbGroup {
    PX,
    PY,
    Z1,
    Z2,
    PreviousAccumulator,
    CurrentAccumulator,
    Quotient,
    RelationWide,
}

impl fmt::Display for LimbGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimbGroup::PX => "P.x",
            LimbGroup::PY => "P.y",
            LimbGroup::Z1 => "z_1",
            LimbGroup::Z2 => "z_2",
            LimbGroup::PreviousAccumulator => "previous accumulator",
            LimbGroup::CurrentAccumulator => "current accumulator",
            LimbGroup::Quotient => "quotient",
            LimbGroup::RelationWide => "relation-wide",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WellFormednessError {
    #[error("op code {0} is not one of {valid:?}", valid = EccOpCode::VALID_VALUES)]
    InvalidOpCode(u32),
    #[error("op-log value {field} does not fit in {bits} bits")]
    OpValueTooWide { field: &'static str, bits: u32 },
    #[error("{group} limb {limb} does not fit in {bits} bits")]
    LimbTooWide { group: LimbGroup, limb: usize, bits: u32 },
    #[error("{group} limbs do not recompose to the op-log value")]
    LimbRecomposition { group: LimbGroup },
    #[error("{group} limbs are not reduced modulo q")]
    NotReduced { group: LimbGroup },
    #[error("{group} limb {limb}: microlimb {micro} does not fit in 14 bits")]
    MicroLimbTooWide { group: LimbGroup, limb: usize, micro: usize },
    #[error("{group} limb {limb}: microlimbs do not recompose to the limb")]
    MicroLimbRecomposition { group: LimbGroup, limb: usize },
    #[error("{group} limb {limb}: tail microlimb is not the shifted top chunk")]
    TailMismatch { group: LimbGroup, limb: usize },
    #[error("{group} limb {limb}: unused microlimb slot {micro} is nonzero")]
    UnusedMicroLimbSlot { group: LimbGroup, limb: usize, micro: usize },
    #[error("relation-wide limb {limb} does not carry its half of the reduction modulo 2^136")]
    RelationMismatch { limb: usize },
    #[error("accumulation relation does not vanish modulo r")]
    NativeRelation,
    #[error("accumulation identity does not hold over the integers")]
    IntegerIdentity,
}

fn fits(value: &Fr, bits: u32) -> bool {
    value.to_u256().fits_in_bits(bits)
}

/// Check an op-log entry: a known op code, coordinate halves of 136/118 bits
/// and z scalars of 128 bits.
pub fn validate_ultra_op(ultra_op: &UltraOp) -> Result<(), WellFormednessError> {
    let op_code = ultra_op.op_code.value();
    if EccOpCode::from_value(op_code).is_none() {
        return Err(WellFormednessError::InvalidOpCode(op_code));
    }
    let checks = [
        ("x_lo", &ultra_op.x_lo, COORDINATE_SPLIT_BITS),
        ("x_hi", &ultra_op.x_hi, COORDINATE_HIGH_BITS),
        ("y_lo", &ultra_op.y_lo, COORDINATE_SPLIT_BITS),
        ("y_hi", &ultra_op.y_hi, COORDINATE_HIGH_BITS),
        ("z_1", &ultra_op.z_1, Z_SCALAR_BITS),
        ("z_2", &ultra_op.z_2, Z_SCALAR_BITS),
    ];
    for (field, value, bits) in checks {
        if !fits(value, bits) {
            return Err(WellFormednessError::OpValueTooWide { field, bits });
        }
    }
    Ok(())
}

fn check_limb_widths(group: LimbGroup, limbs: &[Fr], widths: &[u32]) -> Result<(), WellFormednessError> {
    for (limb, (value, &bits)) in limbs.iter().zip(widths).enumerate() {
        if !fits(value, bits) {
            return Err(WellFormednessError::LimbTooWide { group, limb, bits });
        }
    }
    Ok(())
}

/// Check one limb's microlimbs against the layout for `width`.
///
/// `micro_limbs` may be shorter than six slots when the caller handles the
/// last slot separately.
pub(crate) fn check_micro_limbs(
    group: LimbGroup,
    limb: usize,
    value: &Fr,
    micro_limbs: &[Fr],
    width: u32,
) -> Result<(), WellFormednessError> {
    let layout = MicroLimbLayout::for_width(width);
    debug_assert!(micro_limbs.len() >= layout.used_slots() && micro_limbs.len() <= NUM_MICRO_LIMBS);
    for (micro, chunk) in micro_limbs.iter().enumerate() {
        if !fits(chunk, MICRO_LIMB_BITS) {
            return Err(WellFormednessError::MicroLimbTooWide { group, limb, micro });
        }
    }
    if recompose_micro_limbs(micro_limbs, layout.chunks) != *value {
        return Err(WellFormednessError::MicroLimbRecomposition { group, limb });
    }
    if let Some(tail) = layout.tail {
        let shifted_top = micro_limbs[layout.chunks - 1] * Fr::from(1u64 << tail.shift);
        if micro_limbs[tail.index] != shifted_top {
            return Err(WellFormednessError::TailMismatch { group, limb });
        }
    }
    for (micro, chunk) in micro_limbs.iter().enumerate().skip(layout.used_slots()) {
        if !chunk.is_zero() {
            return Err(WellFormednessError::UnusedMicroLimbSlot { group, limb, micro });
        }
    }
    Ok(())
}

fn check_micro_limb_group<const N: usize>(
    group: LimbGroup,
    limbs: &[Fr; N],
    micro_limbs: &[[Fr; NUM_MICRO_LIMBS]; N],
    widths: [u32; N],
) -> Result<(), WellFormednessError> {
    for (i, (limb, micro)) in limbs.iter().zip(micro_limbs).enumerate() {
        check_micro_limbs(group, i, limb, micro, widths[i])?;
    }
    Ok(())
}

/// Two limbs recompose to a value split at bit 136.
fn check_half_recomposition(group: LimbGroup, limbs: &[Fr], half: &Fr) -> Result<(), WellFormednessError> {
    if recompose_limbs(limbs) != U512::from_u256(half.to_u256()) {
        return Err(WellFormednessError::LimbRecomposition { group });
    }
    Ok(())
}

fn check_reduced(group: LimbGroup, limbs: &[Fr]) -> Result<(), WellFormednessError> {
    if recompose_limbs(limbs) >= constants().modulus_u512 {
        return Err(WellFormednessError::NotReduced { group });
    }
    Ok(())
}

/// Check every member of an accumulation witness: ranges of limbs and
/// microlimbs, their consistency with the op-log entry, and the reduction
/// identity itself (modulo 2^136 twice, modulo r, and over the integers).
pub fn validate_accumulation_input(
    acc_step: &AccumulationInput,
    challenges: &TranslationChallenges,
) -> Result<(), WellFormednessError> {
    use LimbGroup::*;

    let ultra_op = &acc_step.ultra_op;
    validate_ultra_op(ultra_op)?;

    // Binary limbs against the op-log entry
    check_limb_widths(PX, &acc_step.p_x_limbs, &FQ_LIMB_WIDTHS)?;
    check_limb_widths(PY, &acc_step.p_y_limbs, &FQ_LIMB_WIDTHS)?;
    check_limb_widths(Z1, &acc_step.z_1_limbs, &Z_LIMB_WIDTHS)?;
    check_limb_widths(Z2, &acc_step.z_2_limbs, &Z_LIMB_WIDTHS)?;
    check_half_recomposition(PX, &acc_step.p_x_limbs[..2], &ultra_op.x_lo)?;
    check_half_recomposition(PX, &acc_step.p_x_limbs[2..], &ultra_op.x_hi)?;
    check_half_recomposition(PY, &acc_step.p_y_limbs[..2], &ultra_op.y_lo)?;
    check_half_recomposition(PY, &acc_step.p_y_limbs[2..], &ultra_op.y_hi)?;
    check_half_recomposition(Z1, &acc_step.z_1_limbs, &ultra_op.z_1)?;
    check_half_recomposition(Z2, &acc_step.z_2_limbs, &ultra_op.z_2)?;

    check_limb_widths(PreviousAccumulator, &acc_step.previous_accumulator, &FQ_LIMB_WIDTHS)?;
    check_limb_widths(CurrentAccumulator, &acc_step.current_accumulator, &FQ_LIMB_WIDTHS)?;
    check_limb_widths(Quotient, &acc_step.quotient_binary_limbs, &QUOTIENT_LIMB_WIDTHS)?;
    check_reduced(PreviousAccumulator, &acc_step.previous_accumulator)?;
    check_reduced(CurrentAccumulator, &acc_step.current_accumulator)?;

    // Microlimbs
    check_micro_limb_group(PX, &acc_step.p_x_limbs, &acc_step.p_x_microlimbs, FQ_LIMB_WIDTHS)?;
    check_micro_limb_group(PY, &acc_step.p_y_limbs, &acc_step.p_y_microlimbs, FQ_LIMB_WIDTHS)?;
    check_micro_limb_group(Z1, &acc_step.z_1_limbs, &acc_step.z_1_microlimbs, Z_LIMB_WIDTHS)?;
    check_micro_limb_group(Z2, &acc_step.z_2_limbs, &acc_step.z_2_microlimbs, Z_LIMB_WIDTHS)?;
    check_micro_limb_group(
        CurrentAccumulator,
        &acc_step.current_accumulator,
        &acc_step.current_accumulator_microlimbs,
        FQ_LIMB_WIDTHS,
    )?;
    check_micro_limb_group(Quotient, &acc_step.quotient_binary_limbs, &acc_step.quotient_microlimbs, QUOTIENT_LIMB_WIDTHS)?;
    check_limb_widths(RelationWide, &acc_step.relation_wide_limbs, &[RELATION_WIDE_LIMB_BITS; 2])?;
    check_micro_limb_group(
        RelationWide,
        &acc_step.relation_wide_limbs,
        &acc_step.relation_wide_microlimbs,
        [RELATION_WIDE_LIMB_BITS; 2],
    )?;

    // The relation, limb-wise and natively
    let c = constants();
    let operands = acc_step.relation_operands();
    let [low, high] = acc_step.relation_wide_limbs;
    if operands.lower_half(challenges) != low * c.shift_2 {
        return Err(WellFormednessError::RelationMismatch { limb: 0 });
    }
    if operands.upper_half(challenges, low) != high * c.shift_2 {
        return Err(WellFormednessError::RelationMismatch { limb: 1 });
    }
    if !operands.native_relation(challenges).is_zero() {
        return Err(WellFormednessError::NativeRelation);
    }

    // And once more over the integers
    let integer = |value: &Fq| U512::from_u256(value.to_u256());
    let [v, v_squared, v_cubed, v_quarted] = challenges.v_powers.map(|power| integer(&power));
    let unreduced = recompose_limbs(&acc_step.previous_accumulator)
        .wrapping_mul(&integer(&challenges.evaluation_input_x))
        .wrapping_add(&U512::from_u64(ultra_op.op_code.value() as u64))
        .wrapping_add(&recompose_limbs(&acc_step.p_x_limbs).wrapping_mul(&v))
        .wrapping_add(&recompose_limbs(&acc_step.p_y_limbs).wrapping_mul(&v_squared))
        .wrapping_add(&recompose_limbs(&acc_step.z_1_limbs).wrapping_mul(&v_cubed))
        .wrapping_add(&recompose_limbs(&acc_step.z_2_limbs).wrapping_mul(&v_quarted));
    let reduced = recompose_limbs(&acc_step.quotient_binary_limbs)
        .wrapping_mul(&c.modulus_u512)
        .wrapping_add(&recompose_limbs(&acc_step.current_accumulator));
    if unreduced != reduced {
        return Err(WellFormednessError::IntegerIdentity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limbs::split_u256_into_limbs;
    use crate::witness::generate_witness_values;
    use bbrs_numeric::random::DebugRng;
    use bbrs_numeric::U256;
    use bbrs_op_queue::AffinePoint;

    fn random_step(rng: &mut DebugRng) -> (AccumulationInput, TranslationChallenges) {
        let challenges = TranslationChallenges::new(Fq::random_element_with(rng), Fq::random_element_with(rng));
        let point = AffinePoint::new(Fq::random_element_with(rng), Fq::random_element_with(rng));
        let op = UltraOp::new(EccOpCode::MUL, point, rng.get_random_u128(), rng.get_random_u128());
        let previous = Fq::random_element_with(rng);
        (generate_witness_values(&op, &previous, &challenges), challenges)
    }

    #[test]
    fn generated_witnesses_are_well_formed() {
        let mut rng = DebugRng::new(7);
        for _ in 0..8 {
            let (acc_step, challenges) = random_step(&mut rng);
            assert_eq!(validate_accumulation_input(&acc_step, &challenges), Ok(()));
        }
    }

    #[test]
    fn unknown_op_code() {
        let mut op = UltraOp::no_op();
        op.op_code = EccOpCode { add: true, mul: true, eq: false, reset: false };
        assert_eq!(validate_ultra_op(&op), Err(WellFormednessError::InvalidOpCode(12)));
    }

    #[test]
    fn oversized_scalar() {
        let mut op = UltraOp::no_op();
        op.z_2 = Fr::from_u256(U256::pow2(Z_SCALAR_BITS));
        assert_eq!(validate_ultra_op(&op), Err(WellFormednessError::OpValueTooWide { field: "z_2", bits: 128 }));
    }

    #[test]
    fn oversized_coordinate_halves() {
        let cases = [
            ("x_lo", COORDINATE_SPLIT_BITS),
            ("x_hi", COORDINATE_HIGH_BITS),
            ("y_lo", COORDINATE_SPLIT_BITS),
            ("y_hi", COORDINATE_HIGH_BITS),
        ];
        for (field, bits) in cases {
            let mut op = UltraOp::no_op();
            let too_wide = Fr::from_u256(U256::pow2(bits));
            match field {
                "x_lo" => op.x_lo = too_wide,
                "x_hi" => op.x_hi = too_wide,
                "y_lo" => op.y_lo = too_wide,
                _ => op.y_hi = too_wide,
            }
            assert_eq!(validate_ultra_op(&op), Err(WellFormednessError::OpValueTooWide { field, bits }));
        }

        let mut at_bound = UltraOp::no_op();
        at_bound.x_hi = Fr::from_u256(U256::pow2(COORDINATE_HIGH_BITS).wrapping_sub(&U256::ONE));
        assert_eq!(validate_ultra_op(&at_bound), Ok(()));
    }

    /// Moving a carry between limbs keeps the value but breaks the limb width.
    #[test]
    fn carry_shifted_limbs() {
        let mut rng = DebugRng::new(11);
        let (acc_step, challenges) = random_step(&mut rng);
        let carry = Fr::from_u256(U256::pow2(68));

        let mut shifted = acc_step.clone();
        shifted.p_x_limbs[0] += carry;
        shifted.p_x_limbs[1] -= Fr::one();
        assert_eq!(
            validate_accumulation_input(&shifted, &challenges),
            Err(WellFormednessError::LimbTooWide { group: LimbGroup::PX, limb: 0, bits: 68 })
        );

        let mut wide_top = acc_step.clone();
        wide_top.p_y_limbs[3] += Fr::from_u256(U256::pow2(50));
        assert_eq!(
            validate_accumulation_input(&wide_top, &challenges),
            Err(WellFormednessError::LimbTooWide { group: LimbGroup::PY, limb: 3, bits: 50 })
        );

        let mut wide_quotient = acc_step.clone();
        wide_quotient.quotient_binary_limbs[3] = Fr::from_u256(U256::pow2(52));
        assert_eq!(
            validate_accumulation_input(&wide_quotient, &challenges),
            Err(WellFormednessError::LimbTooWide { group: LimbGroup::Quotient, limb: 3, bits: 52 })
        );
    }

    #[test]
    fn accumulator_limbs_must_be_reduced() {
        let mut rng = DebugRng::new(12);
        let (acc_step, challenges) = random_step(&mut rng);
        let modulus_limbs = split_u256_into_limbs(&Fq::MODULUS);

        let mut previous = acc_step.clone();
        previous.previous_accumulator = modulus_limbs;
        assert_eq!(
            validate_accumulation_input(&previous, &challenges),
            Err(WellFormednessError::NotReduced { group: LimbGroup::PreviousAccumulator })
        );

        let mut current = acc_step.clone();
        current.current_accumulator = split_u256_into_limbs(&Fq::MODULUS.wrapping_add(&U256::ONE));
        assert_eq!(
            validate_accumulation_input(&current, &challenges),
            Err(WellFormednessError::NotReduced { group: LimbGroup::CurrentAccumulator })
        );
    }

    #[test]
    fn tampered_current_accumulator() {
        let mut rng = DebugRng::new(8);
        let (mut acc_step, challenges) = random_step(&mut rng);
        acc_step.current_accumulator[0] += Fr::one();
        assert!(validate_accumulation_input(&acc_step, &challenges).is_err());
    }

    #[test]
    fn tampered_quotient_microlimb() {
        let mut rng = DebugRng::new(9);
        let (mut acc_step, challenges) = random_step(&mut rng);
        acc_step.quotient_microlimbs[1][2] += Fr::one();
        let err = validate_accumulation_input(&acc_step, &challenges).unwrap_err();
        assert!(matches!(
            err,
            WellFormednessError::MicroLimbTooWide { group: LimbGroup::Quotient, limb: 1, micro: 2 }
                | WellFormednessError::MicroLimbRecomposition { group: LimbGroup::Quotient, limb: 1 }
        ));
    }

    #[test]
    fn tampered_tail() {
        let mut rng = DebugRng::new(10);
        let (mut acc_step, challenges) = random_step(&mut rng);
        acc_step.p_y_microlimbs[3][4] = Fr::zero();
        acc_step.p_y_microlimbs[3][3] = Fr::one();
        acc_step.p_y_limbs[3] = recompose_micro_limbs(&acc_step.p_y_microlimbs[3], 4);
        // the limb no longer matches y_hi either, but the tail is checked later
        assert!(validate_accumulation_input(&acc_step, &challenges).is_err());

        let layout_check =
            check_micro_limbs(LimbGroup::PY, 3, &acc_step.p_y_limbs[3], &acc_step.p_y_microlimbs[3], 50);
        assert_eq!(layout_check, Err(WellFormednessError::TailMismatch { group: LimbGroup::PY, limb: 3 }));
    }

    #[test]
    fn nonzero_unused_slot() {
        let limb = Fr::from(5);
        let mut micro = [Fr::zero(); NUM_MICRO_LIMBS];
        micro[0] = Fr::from(5);
        assert_eq!(check_micro_limbs(LimbGroup::Quotient, 3, &limb, &micro, 52), Ok(()));
        micro[5] = Fr::one();
        assert_eq!(
            check_micro_limbs(LimbGroup::Quotient, 3, &limb, &micro, 52),
            Err(WellFormednessError::UnusedMicroLimbSlot { group: LimbGroup::Quotient, limb: 3, micro: 5 })
        );
    }

    #[test]
    fn error_messages_name_the_limb() {
        let err = WellFormednessError::LimbTooWide { group: LimbGroup::CurrentAccumulator, limb: 3, bits: 50 };
        assert_eq!(err.to_string(), "current accumulator limb 3 does not fit in 50 bits");
        assert_eq!(
            WellFormednessError::InvalidOpCode(5).to_string(),
            "op code 5 is not one of [0, 1, 2, 3, 4, 8]"
        );
    }

    #[test]
    fn validation_default_follows_build_profile() {
        assert_eq!(WitnessValidation::default().is_enabled(), cfg!(debug_assertions));
    }
}
