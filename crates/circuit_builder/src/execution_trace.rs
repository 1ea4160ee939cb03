//! Fixed-width execution trace block.
//!
//! A block is `NUM_WIRES` parallel columns of variable indices. Columns only
//! ever grow, and a builder appends to every column before it starts its
//! next gate, so all columns have the same length between gates.

/// Wire columns of variable indices, one `Vec` per column.
pub type Wires<const NUM_WIRES: usize> = [Vec<u32>; NUM_WIRES];

/// Append-only wire storage with a fixed row capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTraceBlock<const NUM_WIRES: usize> {
    /// Wire columns (variable indices).
    pub wires: Wires<NUM_WIRES>,
    /// Maximum number of rows the block may hold.
    capacity: usize,
}

impl<const NUM_WIRES: usize> ExecutionTraceBlock<NUM_WIRES> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            wires: std::array::from_fn(|_| Vec::new()),
            capacity,
        }
    }

    /// Number of rows in this block.
    pub fn size(&self) -> usize {
        self.wires.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rows that can still be appended before the capacity is reached.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.size())
    }

    /// Reserve space in all wire vectors, never beyond the capacity.
    pub fn reserve(&mut self, size_hint: usize) {
        let additional = size_hint.min(self.remaining_capacity());
        for wire in &mut self.wires {
            wire.reserve(additional);
        }
    }

    /// Panics unless `rows` more rows fit.
    pub fn assert_can_append(&self, rows: usize) {
        assert!(
            rows <= self.remaining_capacity(),
            "execution trace overflow: {} rows requested, {} of {} rows used",
            rows,
            self.size(),
            self.capacity
        );
    }

    /// Append one variable index to column `wire`.
    #[inline]
    pub fn push(&mut self, wire: usize, variable_index: u32) {
        self.wires[wire].push(variable_index);
    }

    /// Append the same variable index to every column.
    pub fn push_row_of(&mut self, variable_index: u32) {
        for wire in &mut self.wires {
            wire.push(variable_index);
        }
    }

    #[inline]
    pub fn wire(&self, wire: usize) -> &[u32] {
        &self.wires[wire]
    }

    /// Whether every column has the same number of rows.
    pub fn wires_have_equal_length(&self) -> bool {
        let size = self.size();
        self.wires.iter().all(|wire| wire.len() == size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_block() {
        let block = ExecutionTraceBlock::<3>::with_capacity(8);
        assert!(block.is_empty());
        assert_eq!(block.size(), 0);
        assert_eq!(block.remaining_capacity(), 8);
        assert!(block.wires_have_equal_length());
    }

    #[test]
    fn test_push_rows() {
        let mut block = ExecutionTraceBlock::<3>::with_capacity(8);
        block.push_row_of(0);
        block.push(0, 1);
        assert!(!block.wires_have_equal_length());
        block.push(1, 2);
        block.push(2, 3);
        assert!(block.wires_have_equal_length());
        assert_eq!(block.size(), 2);
        assert_eq!(block.wire(1), &[0, 2]);
        assert_eq!(block.remaining_capacity(), 6);
    }

    #[test]
    fn test_reserve_is_bounded_by_capacity() {
        let mut block = ExecutionTraceBlock::<2>::with_capacity(4);
        block.reserve(1 << 20);
        assert!(block.wires.iter().all(|wire| wire.capacity() >= 4));
        assert!(block.is_empty());
    }

    #[test]
    fn test_capacity_check_accepts_exact_fit() {
        let mut block = ExecutionTraceBlock::<1>::with_capacity(2);
        block.push_row_of(0);
        block.assert_can_append(1);
    }

    #[test]
    #[should_panic(expected = "execution trace overflow")]
    fn test_capacity_overflow_panics() {
        let mut block = ExecutionTraceBlock::<1>::with_capacity(2);
        block.push_row_of(0);
        block.assert_can_append(2);
    }
}
