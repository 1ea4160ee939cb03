//! Witness generation for one accumulation step, and the accumulator chain
//! over a whole op log.

use bbrs_ecc::{Fq, Fr};
use bbrs_numeric::{U256, U256Ext, U512, U512Ext};
use bbrs_op_queue::UltraOp;

use crate::constants::{
    constants, FQ_LIMB_WIDTHS, HALF_RELATION_BITS, NUM_BINARY_LIMBS, NUM_MICRO_LIMBS, NUM_RELATION_WIDE_LIMBS,
    NUM_Z_LIMBS, QUOTIENT_LIMB_WIDTHS, Z_LIMB_WIDTHS,
};
use crate::limbs::{
    split_fq_into_limbs, split_limb_into_micro_limbs, split_relation_limb_into_micro_limbs,
    split_u512_into_limbs, split_wide_limb_into_2_limbs,
};
use crate::relation::{RelationOperands, TranslationChallenges};

/// Every witness value one accumulation gate places in the trace.
///
/// Created fresh for each op-log entry and consumed by a single gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulationInput {
    pub ultra_op: UltraOp,

    pub p_x_limbs: [Fr; NUM_BINARY_LIMBS],
    pub p_x_microlimbs: [[Fr; NUM_MICRO_LIMBS]; NUM_BINARY_LIMBS],
    pub p_y_limbs: [Fr; NUM_BINARY_LIMBS],
    pub p_y_microlimbs: [[Fr; NUM_MICRO_LIMBS]; NUM_BINARY_LIMBS],

    pub z_1_limbs: [Fr; NUM_Z_LIMBS],
    pub z_1_microlimbs: [[Fr; NUM_MICRO_LIMBS]; NUM_Z_LIMBS],
    pub z_2_limbs: [Fr; NUM_Z_LIMBS],
    pub z_2_microlimbs: [[Fr; NUM_MICRO_LIMBS]; NUM_Z_LIMBS],

    pub previous_accumulator: [Fr; NUM_BINARY_LIMBS],
    pub current_accumulator: [Fr; NUM_BINARY_LIMBS],
    pub current_accumulator_microlimbs: [[Fr; NUM_MICRO_LIMBS]; NUM_BINARY_LIMBS],

    pub quotient_binary_limbs: [Fr; NUM_BINARY_LIMBS],
    pub quotient_microlimbs: [[Fr; NUM_MICRO_LIMBS]; NUM_BINARY_LIMBS],

    pub relation_wide_limbs: [Fr; NUM_RELATION_WIDE_LIMBS],
    pub relation_wide_microlimbs: [[Fr; NUM_MICRO_LIMBS]; NUM_RELATION_WIDE_LIMBS],
}

impl AccumulationInput {
    /// The values the accumulation relation is evaluated over.
    pub fn relation_operands(&self) -> RelationOperands {
        RelationOperands {
            op: Fr::from(self.ultra_op.op_code.value() as u64),
            p_x_limbs: self.p_x_limbs,
            p_y_limbs: self.p_y_limbs,
            z_1_limbs: self.z_1_limbs,
            z_2_limbs: self.z_2_limbs,
            previous_accumulator: self.previous_accumulator,
            current_accumulator: self.current_accumulator,
            quotient_binary_limbs: self.quotient_binary_limbs,
        }
    }
}

/// Four binary limbs of a coordinate given as (lo, hi) halves split at bit 136.
fn coordinate_limbs(lo: &Fr, hi: &Fr) -> [Fr; NUM_BINARY_LIMBS] {
    let [l0, l1] = split_wide_limb_into_2_limbs(lo);
    let [l2, l3] = split_wide_limb_into_2_limbs(hi);
    [l0, l1, l2, l3]
}

fn micro_limbs_of<const N: usize>(limbs: &[Fr; N], widths: [u32; N]) -> [[Fr; NUM_MICRO_LIMBS]; N] {
    std::array::from_fn(|i| split_limb_into_micro_limbs(&limbs[i], widths[i]))
}

fn to_u512(value: U256) -> U512 {
    U512::from_u256(value)
}

/// The value one entry adds before scaling by the evaluation point:
/// `op + P.x·v + P.y·v² + z_1·v³ + z_2·v⁴` in Fq.
pub fn op_contribution(ultra_op: &UltraOp, challenges: &TranslationChallenges) -> Fq {
    let (p_x, p_y) = ultra_op.get_base_point_standard_form();
    let [v, v_squared, v_cubed, v_quarted] = challenges.v_powers;
    Fq::from(ultra_op.op_code.value() as u64)
        + p_x * v
        + p_y * v_squared
        + Fq::from_u256(ultra_op.z_1.to_u256()) * v_cubed
        + Fq::from_u256(ultra_op.z_2.to_u256()) * v_quarted
}

/// Fold the op log into the accumulator chain.
///
/// Returns `ops.len() + 1` values: `initial`, then
/// `acc[i + 1] = acc[i]·x + op_contribution(ops[i])`.
pub fn compute_accumulator_trace(ops: &[UltraOp], initial: Fq, challenges: &TranslationChallenges) -> Vec<Fq> {
    let mut accumulators = Vec::with_capacity(ops.len() + 1);
    accumulators.push(initial);
    let mut accumulator = initial;
    for op in ops {
        accumulator = accumulator * challenges.evaluation_input_x + op_contribution(op, challenges);
        accumulators.push(accumulator);
    }
    accumulators
}

/// Compute every witness value of one accumulation step.
///
/// The next accumulator and the quotient come from one exact division of
///
/// ```text
/// previous·x + op + P.x·v + P.y·v² + z_1·v³ + z_2·v⁴
/// ```
///
/// by q, computed over 512-bit integers.
pub fn generate_witness_values(
    ultra_op: &UltraOp,
    previous_accumulator: &Fq,
    challenges: &TranslationChallenges,
) -> AccumulationInput {
    let c = constants();
    let (p_x, p_y) = ultra_op.get_base_point_standard_form();
    let [v, v_squared, v_cubed, v_quarted] = challenges.v_powers.map(|power| to_u512(power.to_u256()));

    let unreduced = to_u512(previous_accumulator.to_u256())
        .wrapping_mul(&to_u512(challenges.evaluation_input_x.to_u256()))
        .wrapping_add(&to_u512(ultra_op.z_2.to_u256()).wrapping_mul(&v_quarted))
        .wrapping_add(&to_u512(ultra_op.z_1.to_u256()).wrapping_mul(&v_cubed))
        .wrapping_add(&to_u512(p_y.to_u256()).wrapping_mul(&v_squared))
        .wrapping_add(&to_u512(p_x.to_u256()).wrapping_mul(&v))
        .wrapping_add(&U512::from_u64(ultra_op.op_code.value() as u64));
    let (quotient, remainder) = unreduced.div_rem(&c.modulus_nonzero);
    let current_accumulator = Fq::from_u256(remainder.lo());

    let p_x_limbs = coordinate_limbs(&ultra_op.x_lo, &ultra_op.x_hi);
    let p_y_limbs = coordinate_limbs(&ultra_op.y_lo, &ultra_op.y_hi);
    let z_1_limbs = split_wide_limb_into_2_limbs(&ultra_op.z_1);
    let z_2_limbs = split_wide_limb_into_2_limbs(&ultra_op.z_2);
    let previous_accumulator = split_fq_into_limbs(previous_accumulator);
    let current_accumulator_limbs = split_fq_into_limbs(&current_accumulator);
    let quotient_binary_limbs = split_u512_into_limbs(&quotient);

    let operands = RelationOperands {
        op: Fr::from(ultra_op.op_code.value() as u64),
        p_x_limbs,
        p_y_limbs,
        z_1_limbs,
        z_2_limbs,
        previous_accumulator,
        current_accumulator: current_accumulator_limbs,
        quotient_binary_limbs,
    };
    debug_assert!(
        operands.lower_half(challenges).to_u256().slice(0, HALF_RELATION_BITS) == U256::ZERO,
        "lower half of the reduction is not a multiple of 2^136"
    );
    let relation_wide_limbs = operands.relation_wide_limbs(challenges);

    AccumulationInput {
        ultra_op: *ultra_op,
        p_x_limbs,
        p_x_microlimbs: micro_limbs_of(&p_x_limbs, FQ_LIMB_WIDTHS),
        p_y_limbs,
        p_y_microlimbs: micro_limbs_of(&p_y_limbs, FQ_LIMB_WIDTHS),
        z_1_limbs,
        z_1_microlimbs: micro_limbs_of(&z_1_limbs, Z_LIMB_WIDTHS),
        z_2_limbs,
        z_2_microlimbs: micro_limbs_of(&z_2_limbs, Z_LIMB_WIDTHS),
        previous_accumulator,
        current_accumulator: current_accumulator_limbs,
        current_accumulator_microlimbs: micro_limbs_of(&current_accumulator_limbs, FQ_LIMB_WIDTHS),
        quotient_binary_limbs,
        quotient_microlimbs: micro_limbs_of(&quotient_binary_limbs, QUOTIENT_LIMB_WIDTHS),
        relation_wide_limbs,
        relation_wide_microlimbs: relation_wide_limbs.map(|limb| split_relation_limb_into_micro_limbs(&limb)),
    }
}
