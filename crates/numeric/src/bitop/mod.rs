// Bit manipulation utilities used for sizing circuits and chunking limbs.

/// Position of the most significant set bit (0-indexed). Returns 0 for input 0.
#[inline]
pub fn get_msb64(val: u64) -> u32 {
    if val == 0 { 0 } else { 63 - val.leading_zeros() }
}

/// ceil(numerator / denominator)
#[inline]
pub fn ceil_div(numerator: u32, denominator: u32) -> u32 {
    numerator.div_ceil(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_msb64_cases() {
        assert_eq!(get_msb64(0), 0);
        assert_eq!(get_msb64(1), 0);
        assert_eq!(get_msb64(2), 1);
        assert_eq!(get_msb64(2048), 11);
        assert_eq!(get_msb64(1 << 63), 63);
    }

    #[test]
    fn chunk_counts() {
        // 14-bit chunks per limb width
        assert_eq!(ceil_div(68, 14), 5);
        assert_eq!(ceil_div(50, 14), 4);
        assert_eq!(ceil_div(84, 14), 6);
        assert_eq!(ceil_div(14, 14), 1);
    }
}
