//! CircuitBuilderBase — witness storage shared by circuit builders.
//!
//! Holds the variable table that wire columns index into, the index of the
//! canonical zero witness and the gate counter. Gates themselves live in the
//! builder-specific trace blocks.

use bbrs_ecc::fields::field::Field;
use bbrs_ecc::fields::field_params::FieldParams;
use bbrs_numeric::bitop::get_msb64;

/// Base data and methods shared by all circuit builders.
#[derive(Debug, Clone)]
pub struct CircuitBuilderBase<P: FieldParams> {
    // ── witness storage ─────────────────────────────────────────────────
    /// All witness values used by the circuit.
    variables: Vec<Field<P>>,

    // ── bookkeeping ─────────────────────────────────────────────────────
    /// Index at which a witness constrained to equal 0 is stored.
    zero_idx: u32,

    /// Number of gates in the circuit.
    num_gates: usize,
}

impl<P: FieldParams> CircuitBuilderBase<P> {
    pub fn new() -> Self {
        Self { variables: Vec::new(), zero_idx: 0, num_gates: 0 }
    }

    /// Pre-size the variable table for `size_hint` witnesses.
    pub fn with_size_hint(size_hint: usize) -> Self {
        let mut base = Self::new();
        base.variables.reserve(size_hint);
        base
    }

    // ════════════════════════════════════════════════════════════════════
    //  Variable management
    // ════════════════════════════════════════════════════════════════════

    /// Add a variable (witness) to the circuit.
    ///
    /// Returns the index of the new variable.
    pub fn add_variable(&mut self, value: Field<P>) -> u32 {
        self.variables.push(value);
        self.variables.len() as u32 - 1
    }

    /// Get the witness value for a variable.
    #[inline]
    pub fn get_variable(&self, index: u32) -> Field<P> {
        self.variables[index as usize]
    }

    /// Overwrite the witness value behind `index`.
    ///
    /// Used by tests that tamper with a finished circuit to check that a
    /// checker rejects it.
    #[inline]
    pub fn set_variable_unchecked(&mut self, index: u32, value: Field<P>) {
        self.variables[index as usize] = value;
    }

    /// Read-only access to all variables.
    pub fn get_variables(&self) -> &[Field<P>] {
        &self.variables
    }

    pub fn get_num_variables(&self) -> usize {
        self.variables.len()
    }

    // ════════════════════════════════════════════════════════════════════
    //  Gate count & subgroup size
    // ════════════════════════════════════════════════════════════════════

    pub fn num_gates(&self) -> usize {
        self.num_gates
    }

    pub fn increment_num_gates(&mut self, count: usize) {
        self.num_gates += count;
    }

    /// Smallest power-of-two subgroup that fits `num_gates` gates.
    pub fn get_circuit_subgroup_size(&self, num_gates: usize) -> usize {
        if num_gates == 0 {
            return 1;
        }
        let mut log2_n = get_msb64(num_gates as u64) as usize;
        if (1usize << log2_n) != num_gates {
            log2_n += 1;
        }
        1usize << log2_n
    }

    // ════════════════════════════════════════════════════════════════════
    //  Zero index
    // ════════════════════════════════════════════════════════════════════

    /// Index of the witness constrained to be zero.
    pub fn zero_idx(&self) -> u32 {
        self.zero_idx
    }

    pub fn set_zero_idx(&mut self, value: u32) {
        self.zero_idx = value;
    }
}

impl<P: FieldParams> Default for CircuitBuilderBase<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbrs_ecc::curves::bn254::Bn254FrParams;

    type Fr = Field<Bn254FrParams>;

    #[test]
    fn test_add_and_get_variable() {
        let mut builder = CircuitBuilderBase::<Bn254FrParams>::new();
        let v0 = builder.add_variable(Fr::from(42u64));
        let v1 = builder.add_variable(Fr::from(99u64));
        assert_eq!(v1, v0 + 1);
        assert_eq!(builder.get_variable(v0), Fr::from(42u64));
        assert_eq!(builder.get_variable(v1), Fr::from(99u64));
        assert_eq!(builder.get_num_variables(), 2);
    }

    /// Overwriting a witness changes that index only; equal values stay
    /// separate witnesses.
    #[test]
    fn test_set_variable_unchecked() {
        let mut builder = CircuitBuilderBase::<Bn254FrParams>::with_size_hint(4);
        let idx = builder.add_variable(Fr::from(5u64));
        let twin = builder.add_variable(Fr::from(5u64));
        builder.set_variable_unchecked(idx, Fr::from(6u64));
        assert_eq!(builder.get_variable(idx), Fr::from(6u64));
        assert_eq!(builder.get_variable(twin), Fr::from(5u64));
        assert_eq!(builder.get_variables(), &[Fr::from(6u64), Fr::from(5u64)]);
    }

    #[test]
    fn test_get_circuit_subgroup_size() {
        let builder = CircuitBuilderBase::<Bn254FrParams>::new();
        assert_eq!(builder.get_circuit_subgroup_size(0), 1);
        assert_eq!(builder.get_circuit_subgroup_size(1), 1);
        assert_eq!(builder.get_circuit_subgroup_size(3), 4);
        assert_eq!(builder.get_circuit_subgroup_size(5), 8);
        assert_eq!(builder.get_circuit_subgroup_size(2048), 2048);
        assert_eq!(builder.get_circuit_subgroup_size(2049), 4096);
    }
}
