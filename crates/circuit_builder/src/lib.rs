//! Circuit builder substrate.
//!
//! Provides the witness table (`CircuitBuilderBase`) and fixed-width,
//! capacity-bounded wire storage (`ExecutionTraceBlock`) that concrete
//! circuit builders are assembled from.

pub mod builder_base;
pub mod execution_trace;

pub use builder_base::CircuitBuilderBase;
pub use execution_trace::ExecutionTraceBlock;
