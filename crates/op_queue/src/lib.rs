//! ECC operation log.
//!
//! The log is produced by whoever performs elliptic-curve operations and is
//! consumed by the translator circuit, which proves a batched evaluation of
//! the log's columns over the base field.

pub mod ecc_op_queue;
pub mod ultra_op;

pub use ecc_op_queue::EccOpQueue;
pub use ultra_op::{AffinePoint, EccOpCode, UltraOp};
