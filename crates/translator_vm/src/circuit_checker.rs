//! Re-verifies a finished translator trace from its wire values alone.
//!
//! Nothing generated while building is trusted: every limb, microlimb and
//! relation-wide limb is read back out of the trace and all constraints the
//! translator circuit imposes are evaluated row by row.

use bbrs_ecc::Fr;
use bbrs_numeric::U256Ext;
use bbrs_op_queue::EccOpCode;

use crate::circuit_builder::TranslatorCircuitBuilder;
use crate::constants::{
    constants, FQ_LIMB_WIDTHS, NUM_BINARY_LIMBS, NUM_MICRO_LIMBS, NUM_PADDING_ROWS, QUOTIENT_LIMB_WIDTHS,
    RELATION_WIDE_LIMB_BITS, ROWS_PER_GATE, Z_LIMB_WIDTHS,
};
use crate::limbs::split_fq_into_limbs;
use crate::relation::RelationOperands;
use crate::validation::{check_micro_limbs, LimbGroup, WellFormednessError};
use crate::wire::{AccumulationRows, RangeConstraintGroup, WireId};

/// Values of the trace at a fixed pair of rows.
struct GateView<'a> {
    builder: &'a TranslatorCircuitBuilder,
    rows: AccumulationRows,
}

impl GateView<'_> {
    fn current(&self, wire: WireId) -> Fr {
        self.builder.get_wire_value(wire, self.rows.current.0)
    }

    fn previous(&self, wire: WireId) -> Fr {
        self.builder.get_wire_value(wire, self.rows.previous.0)
    }

    fn pair(&self, wire: WireId) -> [Fr; 2] {
        [self.current(wire), self.previous(wire)]
    }

    fn micro_limbs_at(&self, group: RangeConstraintGroup, row: usize) -> [Fr; NUM_MICRO_LIMBS] {
        let indices = group.wire_indices();
        std::array::from_fn(|i| self.builder.base.get_variable(self.builder.wires.wire(indices.start + i)[row]))
    }

    /// Microlimbs of a group in the even and the odd row.
    fn micro_limbs(&self, group: RangeConstraintGroup) -> [[Fr; NUM_MICRO_LIMBS]; 2] {
        [self.micro_limbs_at(group, self.rows.current.0), self.micro_limbs_at(group, self.rows.previous.0)]
    }

    fn accumulator(&self, row: usize) -> [Fr; NUM_BINARY_LIMBS] {
        WireId::ACCUMULATORS_BINARY_LIMBS.map(|wire| self.builder.get_wire_value(wire, row))
    }

    fn operands(&self) -> RelationOperands {
        let [p_x_0, p_x_1] = self.pair(WireId::PXLowLimbs);
        let [p_x_2, p_x_3] = self.pair(WireId::PXHighLimbs);
        let [p_y_0, p_y_1] = self.pair(WireId::PYLowLimbs);
        let [p_y_2, p_y_3] = self.pair(WireId::PYHighLimbs);
        let [z_1_lo, z_2_lo] = self.pair(WireId::ZLowLimbs);
        let [z_1_hi, z_2_hi] = self.pair(WireId::ZHighLimbs);
        let [quotient_0, quotient_1] = self.pair(WireId::QuotientLowBinaryLimbs);
        let [quotient_2, quotient_3] = self.pair(WireId::QuotientHighBinaryLimbs);
        RelationOperands {
            op: self.current(WireId::Op),
            p_x_limbs: [p_x_0, p_x_1, p_x_2, p_x_3],
            p_y_limbs: [p_y_0, p_y_1, p_y_2, p_y_3],
            z_1_limbs: [z_1_lo, z_1_hi],
            z_2_limbs: [z_2_lo, z_2_hi],
            previous_accumulator: self.accumulator(self.rows.previous.0),
            current_accumulator: self.accumulator(self.rows.current.0),
            quotient_binary_limbs: [quotient_0, quotient_1, quotient_2, quotient_3],
        }
    }
}

/// Checks a [`TranslatorCircuitBuilder`] trace against the translator constraints.
pub struct TranslatorCircuitChecker;

impl TranslatorCircuitChecker {
    /// Returns `Ok(())` if every gate is satisfied, or `Err(message)` listing
    /// each failing gate with its first violated constraint.
    pub fn check(builder: &TranslatorCircuitBuilder) -> Result<(), String> {
        let num_rows = builder.num_rows();
        if num_rows == 0 {
            return Ok(());
        }
        if !builder.wires.wires_have_equal_length() {
            return Err("Circuit check failed: wire columns have different lengths".into());
        }
        if num_rows < NUM_PADDING_ROWS || (num_rows - NUM_PADDING_ROWS) % ROWS_PER_GATE != 0 {
            return Err(format!("Circuit check failed: {num_rows} rows do not form whole accumulation gates"));
        }

        let mut failures = Vec::new();
        if let Err(msg) = Self::check_padding(builder) {
            failures.push(msg);
        }

        let num_accumulation_gates = (num_rows - NUM_PADDING_ROWS) / ROWS_PER_GATE;
        for index in 0..num_accumulation_gates {
            let gate = GateView { builder, rows: AccumulationRows::for_gate(index) };
            let result = Self::check_op_wires(&gate)
                .and_then(|()| Self::check_range_constraints(&gate))
                .and_then(|()| Self::check_accumulation_relation(&gate))
                .and_then(|()| Self::check_accumulator_transfer(&gate, index + 1 == num_accumulation_gates));
            if let Err(msg) = result {
                failures.push(format!("{msg} in gate {index} at row {}", gate.rows.current.0));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            let mut msg = String::from("Circuit check failed:\n");
            for failure in &failures {
                msg.push_str(&format!("  {failure}\n"));
            }
            Err(msg)
        }
    }

    fn check_padding(builder: &TranslatorCircuitBuilder) -> Result<(), String> {
        for (column, wire) in builder.wires.wires.iter().enumerate() {
            for (row, &index) in wire.iter().take(NUM_PADDING_ROWS).enumerate() {
                if !builder.base.get_variable(index).is_zero() {
                    return Err(format!("padding row {row} is nonzero in column {column}"));
                }
            }
        }
        Ok(())
    }

    /// Op code validity, the zero below it, and the op-queue values against
    /// their limb decompositions.
    fn check_op_wires(gate: &GateView<'_>) -> Result<(), String> {
        let op = gate.current(WireId::Op).to_u256();
        let op_code = op.fits_in_bits(4).then(|| op.slice_u64(0, 4) as u32).and_then(EccOpCode::from_value);
        if op_code.is_none() {
            return Err("invalid op code".into());
        }
        if !gate.previous(WireId::Op).is_zero() {
            return Err("nonzero op wire in odd row".into());
        }

        let shift_1 = constants().shift_1;
        let recompose = |wire: WireId| {
            let [lo, hi] = gate.pair(wire);
            lo + hi * shift_1
        };
        let [x_lo, y_hi] = gate.pair(WireId::XLowYHi);
        let [x_hi, z_1] = gate.pair(WireId::XHighZ1);
        let [y_lo, z_2] = gate.pair(WireId::YLowZ2);
        let [z_1_lo, z_2_lo] = gate.pair(WireId::ZLowLimbs);
        let [z_1_hi, z_2_hi] = gate.pair(WireId::ZHighLimbs);
        let checks = [
            ("x_lo", x_lo, recompose(WireId::PXLowLimbs)),
            ("x_hi", x_hi, recompose(WireId::PXHighLimbs)),
            ("y_lo", y_lo, recompose(WireId::PYLowLimbs)),
            ("y_hi", y_hi, recompose(WireId::PYHighLimbs)),
            ("z_1", z_1, z_1_lo + z_1_hi * shift_1),
            ("z_2", z_2, z_2_lo + z_2_hi * shift_1),
        ];
        for (name, value, recomposed) in checks {
            if value != recomposed {
                return Err(format!("{name} does not match its limbs"));
            }
        }
        Ok(())
    }

    /// Every binary limb against its microlimbs, the relation-wide limbs
    /// against the dedicated columns plus the crevices of the top limbs.
    fn check_range_constraints(gate: &GateView<'_>) -> Result<(), String> {
        use RangeConstraintGroup as G;

        let check_pair = |group: LimbGroup,
                          range_group: RangeConstraintGroup,
                          limb_wire: WireId,
                          first_limb: usize,
                          widths: [u32; 2],
                          odd_has_crevice: bool|
         -> Result<(), WellFormednessError> {
            let limbs = gate.pair(limb_wire);
            let [even, odd] = gate.micro_limbs(range_group);
            check_micro_limbs(group, first_limb, &limbs[0], &even, widths[0])?;
            let odd_slots = if odd_has_crevice { &odd[..NUM_MICRO_LIMBS - 1] } else { &odd[..] };
            check_micro_limbs(group, first_limb + 1, &limbs[1], odd_slots, widths[1])
        };
        let low_widths = [FQ_LIMB_WIDTHS[0], FQ_LIMB_WIDTHS[1]];
        let high_widths = [FQ_LIMB_WIDTHS[2], FQ_LIMB_WIDTHS[3]];
        let quotient_high_widths = [QUOTIENT_LIMB_WIDTHS[2], QUOTIENT_LIMB_WIDTHS[3]];

        let result = check_pair(LimbGroup::PX, G::PXLow, WireId::PXLowLimbs, 0, low_widths, false)
            .and_then(|()| check_pair(LimbGroup::PX, G::PXHigh, WireId::PXHighLimbs, 2, high_widths, true))
            .and_then(|()| check_pair(LimbGroup::PY, G::PYLow, WireId::PYLowLimbs, 0, low_widths, false))
            .and_then(|()| check_pair(LimbGroup::PY, G::PYHigh, WireId::PYHighLimbs, 2, high_widths, true))
            .and_then(|()| {
                check_pair(LimbGroup::Quotient, G::QuotientLow, WireId::QuotientLowBinaryLimbs, 0, low_widths, false)
            })
            .and_then(|()| {
                let wire = WireId::QuotientHighBinaryLimbs;
                check_pair(LimbGroup::Quotient, G::QuotientHigh, wire, 2, quotient_high_widths, true)
            });
        result.map_err(|err| err.to_string())?;

        // Accumulator limbs have a column each; the range constraints only cover the current one.
        let current = gate.accumulator(gate.rows.current.0);
        let [acc_0, acc_1] = gate.micro_limbs(G::AccumulatorLow);
        let [acc_2, acc_3] = gate.micro_limbs(G::AccumulatorHigh);
        let group = LimbGroup::CurrentAccumulator;
        check_micro_limbs(group, 0, &current[0], &acc_0, FQ_LIMB_WIDTHS[0])
            .and_then(|()| check_micro_limbs(group, 1, &current[1], &acc_1, FQ_LIMB_WIDTHS[1]))
            .and_then(|()| check_micro_limbs(group, 2, &current[2], &acc_2, FQ_LIMB_WIDTHS[2]))
            .and_then(|()| {
                check_micro_limbs(group, 3, &current[3], &acc_3[..NUM_MICRO_LIMBS - 1], FQ_LIMB_WIDTHS[3])
            })
            .map_err(|err| err.to_string())?;

        // z scalars: the even row is z_1, the odd row z_2.
        let [z_1_lo, z_2_lo] = gate.pair(WireId::ZLowLimbs);
        let [z_1_hi, z_2_hi] = gate.pair(WireId::ZHighLimbs);
        let [z_1_lo_micro, z_2_lo_micro] = gate.micro_limbs(G::ZLow);
        let [z_1_hi_micro, z_2_hi_micro] = gate.micro_limbs(G::ZHigh);
        check_micro_limbs(LimbGroup::Z1, 0, &z_1_lo, &z_1_lo_micro, Z_LIMB_WIDTHS[0])
            .and_then(|()| check_micro_limbs(LimbGroup::Z2, 0, &z_2_lo, &z_2_lo_micro, Z_LIMB_WIDTHS[0]))
            .and_then(|()| check_micro_limbs(LimbGroup::Z1, 1, &z_1_hi, &z_1_hi_micro, Z_LIMB_WIDTHS[1]))
            .and_then(|()| check_micro_limbs(LimbGroup::Z2, 1, &z_2_hi, &z_2_hi_micro, Z_LIMB_WIDTHS[1]))
            .map_err(|err| err.to_string())?;

        // Relation-wide microlimbs 0..4 have their own columns; 4 and 5 sit in the crevices.
        let crevice = |group: RangeConstraintGroup| gate.micro_limbs(group)[1][NUM_MICRO_LIMBS - 1];
        let dedicated = WireId::RELATION_WIDE_LIMBS_RANGE_CONSTRAINTS.map(|wire| gate.pair(wire));
        let low_micro: [Fr; NUM_MICRO_LIMBS] = [
            dedicated[0][0],
            dedicated[1][0],
            dedicated[2][0],
            dedicated[3][0],
            crevice(G::PXHigh),
            crevice(G::AccumulatorHigh),
        ];
        let high_micro: [Fr; NUM_MICRO_LIMBS] = [
            dedicated[0][1],
            dedicated[1][1],
            dedicated[2][1],
            dedicated[3][1],
            crevice(G::PYHigh),
            crevice(G::QuotientHigh),
        ];
        let [relation_low, relation_high] = gate.pair(WireId::RelationWideLimbs);
        check_micro_limbs(LimbGroup::RelationWide, 0, &relation_low, &low_micro, RELATION_WIDE_LIMB_BITS)
            .and_then(|()| {
                check_micro_limbs(LimbGroup::RelationWide, 1, &relation_high, &high_micro, RELATION_WIDE_LIMB_BITS)
            })
            .map_err(|err| err.to_string())
    }

    fn check_accumulation_relation(gate: &GateView<'_>) -> Result<(), String> {
        let challenges = gate.builder.challenges();
        let shift_2 = constants().shift_2;
        let operands = gate.operands();
        let [relation_low, relation_high] = gate.pair(WireId::RelationWideLimbs);
        if operands.lower_half(challenges) != relation_low * shift_2 {
            return Err("lower accumulation relation failed".into());
        }
        if operands.upper_half(challenges, relation_low) != relation_high * shift_2 {
            return Err("upper accumulation relation failed".into());
        }
        if !operands.native_relation(challenges).is_zero() {
            return Err("native accumulation relation failed".into());
        }
        Ok(())
    }

    /// A gate's previous accumulator is the next gate's current one; the last
    /// gate starts from the configured initial accumulator.
    fn check_accumulator_transfer(gate: &GateView<'_>, is_last: bool) -> Result<(), String> {
        let previous = gate.accumulator(gate.rows.previous.0);
        let expected = if is_last {
            split_fq_into_limbs(&gate.builder.config().initial_accumulator)
        } else {
            gate.accumulator(gate.rows.next().current.0)
        };
        if previous != expected {
            let what = if is_last { "initial accumulator" } else { "next gate's accumulator" };
            return Err(format!("previous accumulator differs from the {what}"));
        }
        Ok(())
    }
}
