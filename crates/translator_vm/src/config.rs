use bbrs_ecc::Fq;

use crate::constants::DEFAULT_TRANSLATOR_VM_LENGTH;
use crate::validation::WitnessValidation;

/// Construction parameters of a [`crate::TranslatorCircuitBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Row capacity of the trace.
    pub mini_circuit_size: usize,
    /// Accumulator the op log is folded onto. Nonzero when resuming a chain.
    pub initial_accumulator: Fq,
    pub validation: WitnessValidation,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            mini_circuit_size: DEFAULT_TRANSLATOR_VM_LENGTH,
            initial_accumulator: Fq::zero(),
            validation: WitnessValidation::default(),
        }
    }
}

impl TranslatorConfig {
    pub fn with_mini_circuit_size(mut self, mini_circuit_size: usize) -> Self {
        self.mini_circuit_size = mini_circuit_size;
        self
    }

    pub fn with_initial_accumulator(mut self, initial_accumulator: Fq) -> Self {
        self.initial_accumulator = initial_accumulator;
        self
    }

    pub fn with_validation(mut self, validation: WitnessValidation) -> Self {
        self.validation = validation;
        self
    }
}
