//! Ordered log of ECC operations.
//!
//! Producers record operations here; consumers read the log once, in
//! insertion order, as a sequence of [`UltraOp`]s.

use bbrs_ecc::Fr;
use bbrs_numeric::U256Ext;

use crate::ultra_op::{AffinePoint, EccOpCode, UltraOp, Z_SCALAR_BITS};

#[derive(Debug, Clone, Default)]
pub struct EccOpQueue {
    ultra_ops: Vec<UltraOp>,
}

impl EccOpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `P` being added to the running point.
    pub fn add_accumulate(&mut self, point: AffinePoint) -> &UltraOp {
        self.push(UltraOp::new(EccOpCode::ADD, point, 0, 0))
    }

    /// Record `scalar·P` being added to the running point. The scalar is
    /// carried as two 128-bit halves, `scalar = z_1 + z_2·2^128`.
    pub fn mul_accumulate(&mut self, point: AffinePoint, scalar: Fr) -> &UltraOp {
        let value = scalar.to_u256();
        let z_1 = *value.slice(0, Z_SCALAR_BITS).as_words();
        let z_2 = *value.slice(Z_SCALAR_BITS, 2 * Z_SCALAR_BITS).as_words();
        let to_u128 = |words: [u64; 4]| (words[1] as u128) << 64 | words[0] as u128;
        self.push(UltraOp::new(EccOpCode::MUL, point, to_u128(z_1), to_u128(z_2)))
    }

    /// Record a check of the running point against `expected`, followed by a reset.
    pub fn eq_and_reset(&mut self, expected: AffinePoint) -> &UltraOp {
        self.push(UltraOp::new(EccOpCode::EQ_AND_RESET, expected, 0, 0))
    }

    pub fn no_op(&mut self) -> &UltraOp {
        self.push(UltraOp::no_op())
    }

    /// Append an already-constructed entry.
    pub fn push(&mut self, op: UltraOp) -> &UltraOp {
        self.ultra_ops.push(op);
        &self.ultra_ops[self.ultra_ops.len() - 1]
    }

    pub fn get_ultra_ops(&self) -> &[UltraOp] {
        &self.ultra_ops
    }

    pub fn len(&self) -> usize {
        self.ultra_ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ultra_ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UltraOp> {
        self.ultra_ops.iter()
    }
}

impl IntoIterator for EccOpQueue {
    type Item = UltraOp;
    type IntoIter = std::vec::IntoIter<UltraOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ultra_ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a EccOpQueue {
    type Item = &'a UltraOp;
    type IntoIter = std::slice::Iter<'a, UltraOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ultra_ops.iter()
    }
}

impl FromIterator<UltraOp> for EccOpQueue {
    fn from_iter<I: IntoIterator<Item = UltraOp>>(iter: I) -> Self {
        Self { ultra_ops: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbrs_ecc::Fq;
    use bbrs_numeric::U256;

    #[test]
    fn records_operations_in_order() {
        let point = AffinePoint::new(Fq::from(5), Fq::from(6));
        let mut queue = EccOpQueue::new();
        assert!(queue.is_empty());
        queue.add_accumulate(point);
        queue.mul_accumulate(point, Fr::from(9));
        queue.eq_and_reset(point);
        queue.no_op();

        let codes: Vec<u32> = queue.iter().map(|op| op.op_code.value()).collect();
        assert_eq!(codes, vec![8, 4, 3, 0]);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.get_ultra_ops()[1].z_1, Fr::from(9));
    }

    #[test]
    fn mul_scalar_halves_recombine() {
        let mut queue = EccOpQueue::new();
        let scalar = Fr::random_element();
        let op = *queue.mul_accumulate(AffinePoint::new(Fq::one(), Fq::one()), scalar);
        let shift = Fr::from_u256(U256::pow2(Z_SCALAR_BITS));
        assert_eq!(op.z_1 + op.z_2 * shift, scalar);
        assert!(op.z_1.to_u256().fits_in_bits(Z_SCALAR_BITS));
        assert!(op.z_2.to_u256().fits_in_bits(Z_SCALAR_BITS));
    }

    #[test]
    fn owned_iteration_consumes_the_log() {
        let queue: EccOpQueue = std::iter::repeat_with(UltraOp::no_op).take(3).collect();
        let ops: Vec<UltraOp> = queue.into_iter().collect();
        assert_eq!(ops.len(), 3);
    }
}
