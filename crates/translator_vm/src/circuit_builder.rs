//! TranslatorCircuitBuilder: lays the ECC op log into the translator trace.
//!
//! The circuit proves that the accumulator
//!
//! ```text
//! acc = Σ_i (op_i + P.x_i·v + P.y_i·v² + z_1,i·v³ + z_2,i·v⁴) · x^(n-1-i)
//! ```
//!
//! was computed correctly in Fq, with all arithmetic emulated over Fr. Each
//! op-log entry becomes one two-row accumulation gate. Gates are laid out in
//! reverse order, so the last entry's gate, which holds the final result,
//! sits right after the padding rows.

use bbrs_circuit_builder::{CircuitBuilderBase, ExecutionTraceBlock};
use bbrs_ecc::curves::bn254::Bn254FrParams;
use bbrs_ecc::{Fq, Fr};
use bbrs_op_queue::{EccOpQueue, UltraOp};
use rayon::prelude::*;
use tracing::{debug, debug_span, trace};

use crate::config::TranslatorConfig;
use crate::constants::{NUM_MICRO_LIMBS, NUM_PADDING_ROWS, NUM_WIRES, RESULT_ROW, ROWS_PER_GATE};
use crate::limbs::fq_from_limbs;
use crate::relation::TranslationChallenges;
use crate::validation::validate_accumulation_input;
use crate::wire::{AccumulationRows, RangeConstraintGroup, WireId};
use crate::witness::{compute_accumulator_trace, generate_witness_values, AccumulationInput};

/// Replace the last microlimb slot of a top limb with a relation-wide microlimb.
fn with_crevice(micro_limbs: &[Fr; NUM_MICRO_LIMBS], value: Fr) -> [Fr; NUM_MICRO_LIMBS] {
    let mut packed = *micro_limbs;
    packed[NUM_MICRO_LIMBS - 1] = value;
    packed
}

#[derive(Debug, Clone)]
pub struct TranslatorCircuitBuilder {
    pub base: CircuitBuilderBase<Bn254FrParams>,
    pub wires: ExecutionTraceBlock<NUM_WIRES>,
    challenges: TranslationChallenges,
    config: TranslatorConfig,
}

impl TranslatorCircuitBuilder {
    /// An empty builder with the default configuration.
    pub fn new(batching_challenge_v: Fq, evaluation_input_x: Fq) -> Self {
        Self::with_config(batching_challenge_v, evaluation_input_x, TranslatorConfig::default())
    }

    pub fn with_config(batching_challenge_v: Fq, evaluation_input_x: Fq, config: TranslatorConfig) -> Self {
        let mut base = CircuitBuilderBase::with_size_hint(config.mini_circuit_size * NUM_WIRES);
        let zero_idx = base.add_variable(Fr::zero());
        base.set_zero_idx(zero_idx);
        Self {
            base,
            wires: ExecutionTraceBlock::with_capacity(config.mini_circuit_size),
            challenges: TranslationChallenges::new(batching_challenge_v, evaluation_input_x),
            config,
        }
    }

    /// Build the whole circuit for the entries of `op_queue`.
    pub fn with_op_queue(batching_challenge_v: Fq, evaluation_input_x: Fq, op_queue: &EccOpQueue) -> Self {
        let mut builder = Self::new(batching_challenge_v, evaluation_input_x);
        builder.feed_ecc_op_queue_into_circuit(op_queue.iter().copied());
        builder
    }

    // ════════════════════════════════════════════════════════════════════
    //  Wire population
    // ════════════════════════════════════════════════════════════════════

    /// Add `first` and `second` as witnesses and append them to `wire`.
    fn insert_pair_into_wire(&mut self, wire: WireId, first: Fr, second: Fr) {
        let first = self.base.add_variable(first);
        let second = self.base.add_variable(second);
        self.wires.push(wire.index(), first);
        self.wires.push(wire.index(), second);
    }

    /// Place one limb's microlimbs across the group's columns in the even row
    /// and another limb's in the odd row.
    fn lay_limbs_in_row(
        &mut self,
        group: RangeConstraintGroup,
        even: &[Fr; NUM_MICRO_LIMBS],
        odd: &[Fr; NUM_MICRO_LIMBS],
    ) {
        for (wire, (first, second)) in group.wire_indices().zip(even.iter().zip(odd)) {
            let first = self.base.add_variable(*first);
            let second = self.base.add_variable(*second);
            self.wires.push(wire, first);
            self.wires.push(wire, second);
        }
    }

    /// The raw op-log entry goes into the first four columns.
    fn populate_wires_from_ultra_op(&mut self, ultra_op: &UltraOp) {
        let op = self.base.add_variable(Fr::from(ultra_op.op_code.value() as u64));
        self.wires.push(WireId::Op.index(), op);
        self.wires.push(WireId::Op.index(), self.base.zero_idx());

        self.insert_pair_into_wire(WireId::XLowYHi, ultra_op.x_lo, ultra_op.y_hi);
        self.insert_pair_into_wire(WireId::XHighZ1, ultra_op.x_hi, ultra_op.z_1);
        self.insert_pair_into_wire(WireId::YLowZ2, ultra_op.y_lo, ultra_op.z_2);
    }

    fn push_padding_rows(&mut self) {
        let zero_idx = self.base.zero_idx();
        for _ in 0..NUM_PADDING_ROWS {
            self.wires.push_row_of(zero_idx);
        }
    }

    // ════════════════════════════════════════════════════════════════════
    //  Gates
    // ════════════════════════════════════════════════════════════════════

    /// Lay one accumulation step into the next two rows.
    ///
    /// Gates must be created last entry first: each gate's previous
    /// accumulator is the current accumulator of the gate laid after it.
    /// The witness is checked first unless the configuration skips
    /// validation. Panics if the witness is malformed or the trace is full.
    pub(crate) fn create_accumulation_gate(&mut self, acc_step: &AccumulationInput) -> AccumulationRows {
        if self.config.validation.is_enabled() {
            if let Err(err) = validate_accumulation_input(acc_step, &self.challenges) {
                let row = if self.wires.is_empty() { NUM_PADDING_ROWS } else { self.wires.size() };
                panic!("gate at row {row}: malformed accumulation witness: {err}");
            }
        }
        self.emit_accumulation_gate(acc_step)
    }

    fn emit_accumulation_gate(&mut self, acc_step: &AccumulationInput) -> AccumulationRows {
        if self.wires.is_empty() {
            self.wires.assert_can_append(NUM_PADDING_ROWS + ROWS_PER_GATE);
            self.push_padding_rows();
        } else {
            self.wires.assert_can_append(ROWS_PER_GATE);
        }
        let rows = AccumulationRows::starting_at(self.wires.size());

        self.populate_wires_from_ultra_op(&acc_step.ultra_op);

        let [p_x_0, p_x_1, p_x_2, p_x_3] = acc_step.p_x_limbs;
        let [p_y_0, p_y_1, p_y_2, p_y_3] = acc_step.p_y_limbs;
        let [quotient_0, quotient_1, quotient_2, quotient_3] = acc_step.quotient_binary_limbs;
        self.insert_pair_into_wire(WireId::PXLowLimbs, p_x_0, p_x_1);
        self.insert_pair_into_wire(WireId::PXHighLimbs, p_x_2, p_x_3);
        self.insert_pair_into_wire(WireId::PYLowLimbs, p_y_0, p_y_1);
        self.insert_pair_into_wire(WireId::PYHighLimbs, p_y_2, p_y_3);
        self.insert_pair_into_wire(WireId::ZLowLimbs, acc_step.z_1_limbs[0], acc_step.z_2_limbs[0]);
        self.insert_pair_into_wire(WireId::ZHighLimbs, acc_step.z_1_limbs[1], acc_step.z_2_limbs[1]);
        for (i, wire) in WireId::ACCUMULATORS_BINARY_LIMBS.into_iter().enumerate() {
            self.insert_pair_into_wire(wire, acc_step.current_accumulator[i], acc_step.previous_accumulator[i]);
        }
        self.insert_pair_into_wire(WireId::QuotientLowBinaryLimbs, quotient_0, quotient_1);
        self.insert_pair_into_wire(WireId::QuotientHighBinaryLimbs, quotient_2, quotient_3);
        let [relation_low, relation_high] = acc_step.relation_wide_limbs;
        self.insert_pair_into_wire(WireId::RelationWideLimbs, relation_low, relation_high);

        // Top limbs leave their last slot free; relation-wide microlimbs 4 and 5 go there.
        let [low_micro, high_micro] = &acc_step.relation_wide_microlimbs;
        let p_x = &acc_step.p_x_microlimbs;
        let p_y = &acc_step.p_y_microlimbs;
        let current = &acc_step.current_accumulator_microlimbs;
        let quotient = &acc_step.quotient_microlimbs;
        self.lay_limbs_in_row(RangeConstraintGroup::PXLow, &p_x[0], &p_x[1]);
        self.lay_limbs_in_row(RangeConstraintGroup::PXHigh, &p_x[2], &with_crevice(&p_x[3], low_micro[4]));
        self.lay_limbs_in_row(RangeConstraintGroup::PYLow, &p_y[0], &p_y[1]);
        self.lay_limbs_in_row(RangeConstraintGroup::PYHigh, &p_y[2], &with_crevice(&p_y[3], high_micro[4]));
        self.lay_limbs_in_row(RangeConstraintGroup::ZLow, &acc_step.z_1_microlimbs[0], &acc_step.z_2_microlimbs[0]);
        self.lay_limbs_in_row(RangeConstraintGroup::ZHigh, &acc_step.z_1_microlimbs[1], &acc_step.z_2_microlimbs[1]);
        self.lay_limbs_in_row(RangeConstraintGroup::AccumulatorLow, &current[0], &current[1]);
        self.lay_limbs_in_row(
            RangeConstraintGroup::AccumulatorHigh,
            &current[2],
            &with_crevice(&current[3], low_micro[5]),
        );
        self.lay_limbs_in_row(RangeConstraintGroup::QuotientLow, &quotient[0], &quotient[1]);
        self.lay_limbs_in_row(
            RangeConstraintGroup::QuotientHigh,
            &quotient[2],
            &with_crevice(&quotient[3], high_micro[5]),
        );
        for (i, wire) in WireId::RELATION_WIDE_LIMBS_RANGE_CONSTRAINTS.into_iter().enumerate() {
            self.insert_pair_into_wire(wire, low_micro[i], high_micro[i]);
        }

        self.base.increment_num_gates(ROWS_PER_GATE);
        debug_assert!(self.wires.wires_have_equal_length());
        trace!(row = rows.current.0, op = acc_step.ultra_op.op_code.value(), "accumulation gate");
        rows
    }

    /// Fold the op log onto the configured initial accumulator and lay out
    /// one accumulation gate per entry.
    ///
    /// The accumulator chain is computed first; witnesses for all entries are
    /// then generated (and validated) in parallel and written in reverse
    /// order. May be called once, on an empty builder.
    #[tracing::instrument(skip_all, name = "TranslatorCircuitBuilder::feed_ecc_op_queue_into_circuit")]
    pub fn feed_ecc_op_queue_into_circuit<I>(&mut self, ultra_ops: I)
    where
        I: IntoIterator<Item = UltraOp>,
    {
        assert!(self.wires.is_empty(), "the op log has already been laid into this trace");
        let ultra_ops: Vec<UltraOp> = ultra_ops.into_iter().collect();
        debug!(num_ops = ultra_ops.len(), "feeding op log");
        if ultra_ops.is_empty() {
            return;
        }
        self.wires.assert_can_append(NUM_PADDING_ROWS + ROWS_PER_GATE * ultra_ops.len());
        self.wires.reserve(NUM_PADDING_ROWS + ROWS_PER_GATE * ultra_ops.len());

        let challenges = self.challenges;
        let validation = self.config.validation;
        let accumulators = debug_span!("accumulator_trace")
            .in_scope(|| compute_accumulator_trace(&ultra_ops, self.config.initial_accumulator, &challenges));

        let acc_steps: Vec<AccumulationInput> = debug_span!("generate_witnesses").in_scope(|| {
            ultra_ops
                .par_iter()
                .zip(accumulators[..ultra_ops.len()].par_iter())
                .enumerate()
                .map(|(i, (ultra_op, previous_accumulator))| {
                    let acc_step = generate_witness_values(ultra_op, previous_accumulator, &challenges);
                    if validation.is_enabled() {
                        if let Err(err) = validate_accumulation_input(&acc_step, &challenges) {
                            panic!("op-log entry {i}: malformed accumulation witness: {err}");
                        }
                    }
                    debug_assert_eq!(fq_from_limbs(&acc_step.current_accumulator), accumulators[i + 1]);
                    acc_step
                })
                .collect()
        });

        debug_span!("emit_gates").in_scope(|| {
            for acc_step in acc_steps.iter().rev() {
                self.emit_accumulation_gate(acc_step);
            }
        });
        debug!(num_rows = self.num_rows(), num_gates = self.num_gates(), "op log laid out");
    }

    // ════════════════════════════════════════════════════════════════════
    //  Accessors
    // ════════════════════════════════════════════════════════════════════

    /// Value of `wire` at `row`.
    pub fn get_wire_value(&self, wire: WireId, row: usize) -> Fr {
        self.base.get_variable(self.wires.wire(wire.index())[row])
    }

    /// The accumulated value: the current accumulator at [`RESULT_ROW`], or
    /// the initial accumulator when nothing has been laid out.
    pub fn get_computation_result(&self) -> Fq {
        if self.wires.is_empty() {
            return self.config.initial_accumulator;
        }
        let limbs = WireId::ACCUMULATORS_BINARY_LIMBS.map(|wire| self.get_wire_value(wire, RESULT_ROW));
        fq_from_limbs(&limbs)
    }

    /// Rows taken by accumulation gates, padding excluded.
    pub fn num_gates(&self) -> usize {
        self.base.num_gates()
    }

    /// Rows in the trace, padding included.
    pub fn num_rows(&self) -> usize {
        self.wires.size()
    }

    /// Smallest power of two that holds the trace.
    pub fn mini_circuit_dyadic_size(&self) -> usize {
        self.base.get_circuit_subgroup_size(self.num_rows())
    }

    pub fn challenges(&self) -> &TranslationChallenges {
        &self.challenges
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::WitnessValidation;
    use bbrs_op_queue::{AffinePoint, EccOpCode};

    fn single_op_builder() -> TranslatorCircuitBuilder {
        let mut builder = TranslatorCircuitBuilder::new(Fq::from(3), Fq::from(2));
        let reset = EccOpCode::from_value(1).unwrap();
        builder.feed_ecc_op_queue_into_circuit([UltraOp::new(reset, AffinePoint::infinity(), 0, 0)]);
        builder
    }

    #[test]
    fn padding_rows_are_zero() {
        let builder = single_op_builder();
        assert_eq!(builder.num_rows(), NUM_PADDING_ROWS + ROWS_PER_GATE);
        for wire in &builder.wires.wires {
            assert_eq!(wire[0], builder.base.zero_idx());
            assert_eq!(wire[1], builder.base.zero_idx());
        }
    }

    #[test]
    fn op_wire_layout() {
        let builder = single_op_builder();
        assert_eq!(builder.get_wire_value(WireId::Op, RESULT_ROW), Fr::one());
        assert!(builder.get_wire_value(WireId::Op, RESULT_ROW + 1).is_zero());
        assert_eq!(builder.wires.wire(WireId::Op.index())[RESULT_ROW + 1], builder.base.zero_idx());
    }

    #[test]
    fn accumulator_columns_hold_current_then_previous() {
        let initial = Fq::from(10);
        let config = TranslatorConfig::default().with_initial_accumulator(initial);
        let mut builder = TranslatorCircuitBuilder::with_config(Fq::from(3), Fq::from(2), config);
        builder.feed_ecc_op_queue_into_circuit([UltraOp::no_op()]);
        // 10·2 + 0
        assert_eq!(builder.get_computation_result(), Fq::from(20));
        assert_eq!(builder.get_wire_value(WireId::AccumulatorsBinaryLimbs0, RESULT_ROW + 1), Fr::from(10));
    }

    #[test]
    fn crevices_carry_relation_microlimbs() {
        let mut builder = TranslatorCircuitBuilder::with_config(
            Fq::random_element(),
            Fq::random_element(),
            TranslatorConfig::default().with_validation(WitnessValidation::Full),
        );
        let point = AffinePoint::new(Fq::random_element(), Fq::random_element());
        let op = UltraOp::new(EccOpCode::MUL, point, u128::MAX, 1 << 100);
        let acc_step = generate_witness_values(&op, &Fq::random_element(), builder.challenges());
        let rows = builder.create_accumulation_gate(&acc_step);
        let odd = rows.previous.0;
        let crevice =
            |group: RangeConstraintGroup| builder.base.get_variable(builder.wires.wire(group.tail_wire())[odd]);
        let [low, high] = acc_step.relation_wide_microlimbs;
        assert_eq!(crevice(RangeConstraintGroup::PXHigh), low[4]);
        assert_eq!(crevice(RangeConstraintGroup::PYHigh), high[4]);
        assert_eq!(crevice(RangeConstraintGroup::AccumulatorHigh), low[5]);
        assert_eq!(crevice(RangeConstraintGroup::QuotientHigh), high[5]);
        assert_eq!(builder.get_wire_value(WireId::RelationWideLimbsRangeConstraint3, rows.current.0), low[3]);
        assert_eq!(builder.get_computation_result(), fq_from_limbs(&acc_step.current_accumulator));
    }

    #[test]
    #[should_panic(expected = "gate at row 2: malformed accumulation witness")]
    fn malformed_gate_is_rejected() {
        let mut builder = TranslatorCircuitBuilder::with_config(
            Fq::from(5),
            Fq::from(7),
            TranslatorConfig::default().with_validation(WitnessValidation::Full),
        );
        let mut acc_step = generate_witness_values(&UltraOp::no_op(), &Fq::one(), builder.challenges());
        acc_step.relation_wide_microlimbs[0][0] += Fr::one();
        builder.create_accumulation_gate(&acc_step);
    }

    #[test]
    #[should_panic(expected = "gate at row 4: malformed accumulation witness")]
    fn malformed_gate_names_its_row() {
        let mut builder = TranslatorCircuitBuilder::with_config(
            Fq::from(5),
            Fq::from(7),
            TranslatorConfig::default().with_validation(WitnessValidation::Full),
        );
        let acc_step = generate_witness_values(&UltraOp::no_op(), &Fq::one(), builder.challenges());
        builder.create_accumulation_gate(&acc_step);
        let mut second = generate_witness_values(&UltraOp::no_op(), &Fq::from(2), builder.challenges());
        second.current_accumulator[0] += Fr::one();
        builder.create_accumulation_gate(&second);
    }

    /// Gates created by hand, last entry first, give the same trace as the driver.
    #[test]
    fn gates_created_last_entry_first() {
        let ops = [UltraOp::new(EccOpCode::from_value(1).unwrap(), AffinePoint::infinity(), 0, 0), UltraOp::no_op()];
        let config = TranslatorConfig::default().with_validation(WitnessValidation::Full);
        let mut fed = TranslatorCircuitBuilder::with_config(Fq::from(3), Fq::from(2), config);
        fed.feed_ecc_op_queue_into_circuit(ops);

        let mut by_hand = TranslatorCircuitBuilder::with_config(Fq::from(3), Fq::from(2), config);
        let first = generate_witness_values(&ops[0], &Fq::zero(), by_hand.challenges());
        let second = generate_witness_values(&ops[1], &fq_from_limbs(&first.current_accumulator), by_hand.challenges());
        let rows = by_hand.create_accumulation_gate(&second);
        by_hand.create_accumulation_gate(&first);

        assert_eq!(rows.current.0, RESULT_ROW);
        // (0·2 + 1)·2 + 0
        assert_eq!(by_hand.get_computation_result(), Fq::from(2));
        assert_eq!(by_hand.get_computation_result(), fed.get_computation_result());
        assert_eq!(crate::TranslatorCircuitChecker::check(&by_hand), Ok(()));
    }

    #[test]
    #[should_panic(expected = "already been laid")]
    fn op_log_is_fed_once() {
        let mut builder = single_op_builder();
        builder.feed_ecc_op_queue_into_circuit([UltraOp::no_op()]);
    }
}
