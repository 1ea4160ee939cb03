//! Prime fields over BN254.
//!
//! `Fr` is the native scalar field of circuits built in this workspace; `Fq`
//! is the base field, which circuits can only reach through limb emulation.

pub mod curves;
pub mod fields;

pub use curves::bn254::{Fq, Fr};
pub use fields::field::Field;
pub use fields::field_params::FieldParams;
