/// Parameters for a prime field held in Montgomery form.
///
/// All constants use 4 x u64 limbs in little-endian order.
/// Elements are stored as `a * R mod p` where `R = 2^256`.
///
/// The arithmetic in [`super::field::Field`] assumes `p < 2^255`, so that a
/// sum of two reduced elements never overflows 256 bits.
pub trait FieldParams: 'static + Send + Sync + Sized {
    /// The prime modulus p.
    const MODULUS: [u64; 4];

    /// R^2 mod p, used to convert into Montgomery form.
    const R_SQUARED: [u64; 4];

    /// -(p^{-1}) mod 2^64, used in Montgomery reduction.
    const R_INV: u64;
}
