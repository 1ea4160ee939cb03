//! Column layout of the translator trace.
//!
//! Every accumulation gate spans two rows. Columns holding a pair of values
//! store the first in the even row and the second in the odd row. The first
//! four columns carry the raw op-log entry:
//!
//! ```text
//! OP | X_LO | X_HI | Y_LO
//! 0  | Y_HI | Z_1  | Z_2
//! ```
//!
//! The accumulator columns hold the current accumulator in the even row and
//! the previous one in the odd row, so a step's input sits one row below its
//! output and the next gate's output directly below that.

use crate::constants::{NUM_MICRO_LIMBS, NUM_PADDING_ROWS, NUM_WIRES, ROWS_PER_GATE};

/// Every column of the trace, in column order.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireId {
    Op,
    XLowYHi,
    XHighZ1,
    YLowZ2,
    PXLowLimbs,
    PXHighLimbs,
    PYLowLimbs,
    PYHighLimbs,
    ZLowLimbs,
    ZHighLimbs,
    AccumulatorsBinaryLimbs0,
    AccumulatorsBinaryLimbs1,
    AccumulatorsBinaryLimbs2,
    AccumulatorsBinaryLimbs3,
    QuotientLowBinaryLimbs,
    QuotientHighBinaryLimbs,
    RelationWideLimbs,
    PXLowLimbsRangeConstraint0,
    PXLowLimbsRangeConstraint1,
    PXLowLimbsRangeConstraint2,
    PXLowLimbsRangeConstraint3,
    PXLowLimbsRangeConstraint4,
    PXLowLimbsRangeConstraintTail,
    PXHighLimbsRangeConstraint0,
    PXHighLimbsRangeConstraint1,
    PXHighLimbsRangeConstraint2,
    PXHighLimbsRangeConstraint3,
    PXHighLimbsRangeConstraint4,
    PXHighLimbsRangeConstraintTail,
    PYLowLimbsRangeConstraint0,
    PYLowLimbsRangeConstraint1,
    PYLowLimbsRangeConstraint2,
    PYLowLimbsRangeConstraint3,
    PYLowLimbsRangeConstraint4,
    PYLowLimbsRangeConstraintTail,
    PYHighLimbsRangeConstraint0,
    PYHighLimbsRangeConstraint1,
    PYHighLimbsRangeConstraint2,
    PYHighLimbsRangeConstraint3,
    PYHighLimbsRangeConstraint4,
    PYHighLimbsRangeConstraintTail,
    ZLowLimbsRangeConstraint0,
    ZLowLimbsRangeConstraint1,
    ZLowLimbsRangeConstraint2,
    ZLowLimbsRangeConstraint3,
    ZLowLimbsRangeConstraint4,
    ZLowLimbsRangeConstraintTail,
    ZHighLimbsRangeConstraint0,
    ZHighLimbsRangeConstraint1,
    ZHighLimbsRangeConstraint2,
    ZHighLimbsRangeConstraint3,
    ZHighLimbsRangeConstraint4,
    ZHighLimbsRangeConstraintTail,
    AccumulatorLowLimbsRangeConstraint0,
    AccumulatorLowLimbsRangeConstraint1,
    AccumulatorLowLimbsRangeConstraint2,
    AccumulatorLowLimbsRangeConstraint3,
    AccumulatorLowLimbsRangeConstraint4,
    AccumulatorLowLimbsRangeConstraintTail,
    AccumulatorHighLimbsRangeConstraint0,
    AccumulatorHighLimbsRangeConstraint1,
    AccumulatorHighLimbsRangeConstraint2,
    AccumulatorHighLimbsRangeConstraint3,
    AccumulatorHighLimbsRangeConstraint4,
    AccumulatorHighLimbsRangeConstraintTail,
    QuotientLowLimbsRangeConstraint0,
    QuotientLowLimbsRangeConstraint1,
    QuotientLowLimbsRangeConstraint2,
    QuotientLowLimbsRangeConstraint3,
    QuotientLowLimbsRangeConstraint4,
    QuotientLowLimbsRangeConstraintTail,
    QuotientHighLimbsRangeConstraint0,
    QuotientHighLimbsRangeConstraint1,
    QuotientHighLimbsRangeConstraint2,
    QuotientHighLimbsRangeConstraint3,
    QuotientHighLimbsRangeConstraint4,
    QuotientHighLimbsRangeConstraintTail,
    RelationWideLimbsRangeConstraint0,
    RelationWideLimbsRangeConstraint1,
    RelationWideLimbsRangeConstraint2,
    RelationWideLimbsRangeConstraint3,
}

impl WireId {
    pub const COUNT: usize = WireId::RelationWideLimbsRangeConstraint3 as usize + 1;

    /// Accumulator binary limb columns, lowest limb first.
    pub const ACCUMULATORS_BINARY_LIMBS: [WireId; 4] = [
        WireId::AccumulatorsBinaryLimbs0,
        WireId::AccumulatorsBinaryLimbs1,
        WireId::AccumulatorsBinaryLimbs2,
        WireId::AccumulatorsBinaryLimbs3,
    ];

    /// Dedicated columns for relation-wide microlimbs 0..4.
    pub const RELATION_WIDE_LIMBS_RANGE_CONSTRAINTS: [WireId; 4] = [
        WireId::RelationWideLimbsRangeConstraint0,
        WireId::RelationWideLimbsRangeConstraint1,
        WireId::RelationWideLimbsRangeConstraint2,
        WireId::RelationWideLimbsRangeConstraint3,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl From<WireId> for usize {
    fn from(wire: WireId) -> usize {
        wire.index()
    }
}

/// A block of six consecutive range-constraint columns receiving one limb's
/// microlimbs per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeConstraintGroup {
    PXLow,
    PXHigh,
    PYLow,
    PYHigh,
    ZLow,
    ZHigh,
    AccumulatorLow,
    AccumulatorHigh,
    QuotientLow,
    QuotientHigh,
}

impl RangeConstraintGroup {
    /// First column of the group.
    pub const fn first_wire(self) -> WireId {
        match self {
            Self::PXLow => WireId::PXLowLimbsRangeConstraint0,
            Self::PXHigh => WireId::PXHighLimbsRangeConstraint0,
            Self::PYLow => WireId::PYLowLimbsRangeConstraint0,
            Self::PYHigh => WireId::PYHighLimbsRangeConstraint0,
            Self::ZLow => WireId::ZLowLimbsRangeConstraint0,
            Self::ZHigh => WireId::ZHighLimbsRangeConstraint0,
            Self::AccumulatorLow => WireId::AccumulatorLowLimbsRangeConstraint0,
            Self::AccumulatorHigh => WireId::AccumulatorHighLimbsRangeConstraint0,
            Self::QuotientLow => WireId::QuotientLowLimbsRangeConstraint0,
            Self::QuotientHigh => WireId::QuotientHighLimbsRangeConstraint0,
        }
    }

    /// Column indices of the group, microlimb 0 first, tail last.
    pub fn wire_indices(self) -> std::ops::Range<usize> {
        let first = self.first_wire().index();
        first..first + NUM_MICRO_LIMBS
    }

    /// Column of the group's last slot (the tail, or a relation microlimb for top limbs).
    pub fn tail_wire(self) -> usize {
        self.first_wire().index() + NUM_MICRO_LIMBS - 1
    }
}

/// Row holding the values a gate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CurrentRow(pub usize);

/// Row holding the values a gate consumes; always `CurrentRow + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreviousRow(pub usize);

/// The two rows of one accumulation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulationRows {
    pub current: CurrentRow,
    pub previous: PreviousRow,
}

impl AccumulationRows {
    /// Rows of a gate whose even row is `row`.
    pub fn starting_at(row: usize) -> Self {
        debug_assert_eq!(row % ROWS_PER_GATE, 0, "gates start on even rows");
        Self { current: CurrentRow(row), previous: PreviousRow(row + 1) }
    }

    /// Rows of the `index`-th gate after the padding rows.
    pub fn for_gate(index: usize) -> Self {
        Self::starting_at(NUM_PADDING_ROWS + ROWS_PER_GATE * index)
    }

    /// Rows of the following gate. Its current row sits right after this
    /// gate's previous row and must hold the same accumulator.
    pub fn next(self) -> Self {
        Self::starting_at(self.previous.0 + 1)
    }
}

const _: () = assert!(WireId::COUNT == NUM_WIRES);
