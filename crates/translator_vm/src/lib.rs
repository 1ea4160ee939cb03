//! Translator VM circuit builder.
//!
//! Proves that a batched evaluation of the ECC op log's columns was computed
//! correctly over the BN254 base field Fq, inside a circuit whose native
//! field is the scalar field Fr. Fq values are carried as 68-bit binary limbs,
//! every binary limb as 14-bit microlimbs, and each modular
//! multiply-accumulate step is certified modulo 2^272 and modulo r.

pub mod circuit_builder;
pub mod circuit_checker;
pub mod config;
pub mod constants;
pub mod limbs;
pub mod relation;
pub mod validation;
pub mod wire;
pub mod witness;

pub use circuit_builder::TranslatorCircuitBuilder;
pub use circuit_checker::TranslatorCircuitChecker;
pub use config::TranslatorConfig;
pub use relation::TranslationChallenges;
pub use validation::{LimbGroup, WellFormednessError, WitnessValidation};
pub use wire::WireId;
pub use witness::{generate_witness_values, AccumulationInput};
