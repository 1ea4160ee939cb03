//! The non-native accumulation relation evaluated limb-wise in Fr.
//!
//! One accumulation step claims
//!
//! ```text
//! previous·x + op + P.x·v + P.y·v² + z_1·v³ + z_2·v⁴ - quotient·q - current = 0
//! ```
//!
//! over the integers. Writing `-q` as `2^272 - q` and every operand in base
//! 2^68, the left side is checked modulo 2^272 in two halves of 136 bits
//! (each half carries its overflow into an 84-bit relation-wide limb), and
//! once more modulo r using the native values. Both moduli together exceed
//! every value the operands can reach, so the identity holds in integers.

use bbrs_ecc::{Fq, Fr};

use crate::constants::{constants, NUM_BINARY_LIMBS, NUM_CHALLENGE_LIMBS, NUM_RELATION_WIDE_LIMBS, NUM_Z_LIMBS};
use crate::limbs::{recompose_limbs_native, split_challenge_into_limbs};

/// The evaluation point `x` and batching challenge `v`, with the limbs of
/// `x` and of `v, v², v³, v⁴` precomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationChallenges {
    pub evaluation_input_x: Fq,
    pub batching_challenge_v: Fq,
    /// `[v, v², v³, v⁴]`
    pub v_powers: [Fq; 4],
    pub x_limbs: [Fr; NUM_CHALLENGE_LIMBS],
    /// Limbs of `v, v², v³, v⁴` in that order.
    pub v_limbs: [[Fr; NUM_CHALLENGE_LIMBS]; 4],
}

impl TranslationChallenges {
    pub fn new(batching_challenge_v: Fq, evaluation_input_x: Fq) -> Self {
        let v = batching_challenge_v;
        let v_squared = v.sqr();
        let v_cubed = v_squared * v;
        let v_quarted = v_cubed * v;
        let v_powers = [v, v_squared, v_cubed, v_quarted];
        Self {
            evaluation_input_x,
            batching_challenge_v,
            v_powers,
            x_limbs: split_challenge_into_limbs(&evaluation_input_x),
            v_limbs: v_powers.map(|power| split_challenge_into_limbs(&power)),
        }
    }
}

/// Σ a_i·b_j over i + j = position, skipping indices past either operand.
fn limb_products_at(position: usize, a: &[Fr], b: &[Fr]) -> Fr {
    (0..=position)
        .filter(|&i| i < a.len() && position - i < b.len())
        .map(|i| a[i] * b[position - i])
        .sum()
}

/// Every value one accumulation step constrains, as binary limbs.
///
/// Assembled either from freshly generated witnesses or from wire values
/// read back out of a finished trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationOperands {
    pub op: Fr,
    pub p_x_limbs: [Fr; NUM_BINARY_LIMBS],
    pub p_y_limbs: [Fr; NUM_BINARY_LIMBS],
    pub z_1_limbs: [Fr; NUM_Z_LIMBS],
    pub z_2_limbs: [Fr; NUM_Z_LIMBS],
    pub previous_accumulator: [Fr; NUM_BINARY_LIMBS],
    pub current_accumulator: [Fr; NUM_BINARY_LIMBS],
    pub quotient_binary_limbs: [Fr; NUM_BINARY_LIMBS],
}

impl RelationOperands {
    /// Contribution of every term at limb position `position`.
    fn position_sum(&self, position: usize, challenges: &TranslationChallenges) -> Fr {
        let [v, v_squared, v_cubed, v_quarted] = &challenges.v_limbs;
        let mut sum = limb_products_at(position, &self.previous_accumulator, &challenges.x_limbs[..NUM_BINARY_LIMBS])
            + limb_products_at(position, &v[..NUM_BINARY_LIMBS], &self.p_x_limbs)
            + limb_products_at(position, &v_squared[..NUM_BINARY_LIMBS], &self.p_y_limbs)
            + limb_products_at(position, &v_cubed[..NUM_BINARY_LIMBS], &self.z_1_limbs)
            + limb_products_at(position, &v_quarted[..NUM_BINARY_LIMBS], &self.z_2_limbs)
            + limb_products_at(
                position,
                &self.quotient_binary_limbs,
                &constants().negative_modulus_limbs[..NUM_BINARY_LIMBS],
            )
            - self.current_accumulator[position];
        if position == 0 {
            sum += self.op;
        }
        sum
    }

    /// Positions 0 and 1 combined. Vanishes modulo 2^136 for a valid step.
    pub fn lower_half(&self, challenges: &TranslationChallenges) -> Fr {
        self.position_sum(0, challenges) + self.position_sum(1, challenges) * constants().shift_1
    }

    /// Positions 2 and 3 plus the carry out of the lower half. Vanishes
    /// modulo 2^136 for a valid step.
    pub fn upper_half(&self, challenges: &TranslationChallenges, lower_carry: Fr) -> Fr {
        lower_carry + self.position_sum(2, challenges) + self.position_sum(3, challenges) * constants().shift_1
    }

    /// The two relation-wide limbs: each half divided by 2^136.
    ///
    /// Only meaningful when both halves really are multiples of 2^136; the
    /// caller is expected to check the limbs' width afterwards.
    pub fn relation_wide_limbs(&self, challenges: &TranslationChallenges) -> [Fr; NUM_RELATION_WIDE_LIMBS] {
        let shift_2_inverse = constants().shift_2_inverse;
        let low = self.lower_half(challenges) * shift_2_inverse;
        let high = self.upper_half(challenges, low) * shift_2_inverse;
        [low, high]
    }

    /// The whole relation evaluated with native (mod r) values. Zero for a valid step.
    pub fn native_relation(&self, challenges: &TranslationChallenges) -> Fr {
        let c = constants();
        let [v, v_squared, v_cubed, v_quarted] = &challenges.v_limbs;
        let last = NUM_CHALLENGE_LIMBS - 1;
        recompose_limbs_native(&self.previous_accumulator) * challenges.x_limbs[last]
            + self.op
            + recompose_limbs_native(&self.p_x_limbs) * v[last]
            + recompose_limbs_native(&self.p_y_limbs) * v_squared[last]
            + recompose_limbs_native(&self.z_1_limbs) * v_cubed[last]
            + recompose_limbs_native(&self.z_2_limbs) * v_quarted[last]
            + recompose_limbs_native(&self.quotient_binary_limbs) * c.negative_modulus_limbs[last]
            - recompose_limbs_native(&self.current_accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limbs::split_fq_into_limbs;

    #[test]
    fn challenge_powers() {
        let challenges = TranslationChallenges::new(Fq::from(3), Fq::from(2));
        assert_eq!(challenges.v_powers, [Fq::from(3), Fq::from(9), Fq::from(27), Fq::from(81)]);
        assert_eq!(challenges.x_limbs, [Fr::from(2), Fr::zero(), Fr::zero(), Fr::zero(), Fr::from(2)]);
        assert_eq!(challenges.v_limbs[3][0], Fr::from(81));
    }

    #[test]
    fn limb_products_skip_missing_indices() {
        let a = [Fr::from(1), Fr::from(2), Fr::from(3), Fr::from(4)];
        let z = [Fr::from(10), Fr::from(100)];
        // a2·z0 + a1·z1
        assert_eq!(limb_products_at(2, &a, &z), Fr::from(30 + 200));
        // a3·z0 + a2·z1
        assert_eq!(limb_products_at(3, &a, &z), Fr::from(40 + 300));
        assert_eq!(limb_products_at(0, &a, &z), Fr::from(10));
    }

    /// With x = 2 and everything else zero except op, the step is
    /// current = 2·previous + op with no reduction.
    #[test]
    fn small_step_without_reduction() {
        let challenges = TranslationChallenges::new(Fq::zero(), Fq::from(2));
        let operands = RelationOperands {
            op: Fr::from(3),
            p_x_limbs: [Fr::zero(); 4],
            p_y_limbs: [Fr::zero(); 4],
            z_1_limbs: [Fr::zero(); 2],
            z_2_limbs: [Fr::zero(); 2],
            previous_accumulator: split_fq_into_limbs(&Fq::from(5)),
            current_accumulator: split_fq_into_limbs(&Fq::from(13)),
            quotient_binary_limbs: [Fr::zero(); 4],
        };
        assert!(operands.lower_half(&challenges).is_zero());
        assert_eq!(operands.relation_wide_limbs(&challenges), [Fr::zero(), Fr::zero()]);
        assert!(operands.native_relation(&challenges).is_zero());

        let wrong = RelationOperands { op: Fr::from(4), ..operands };
        assert!(!wrong.native_relation(&challenges).is_zero());
        assert!(!wrong.lower_half(&challenges).is_zero());
    }
}
