// Numeric types and operations.
//
// - uint256 / uintx: fixed-width integers backed by crypto-bigint
// - bitop: bit manipulation and sizing helpers
// - random: RNG wrappers

pub mod bitop;
pub mod random;
pub mod uint256;
pub mod uintx;

pub use uint256::{U256, U256Ext};
pub use uintx::{U512, U512Ext};
