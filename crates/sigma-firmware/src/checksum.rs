//! Firmware payload checksum

/// CRC-32 as computed by the Linux SigmaDSP loader.
///
/// Reflected polynomial `0xEDB88320`, register seeded with zero and no
/// final inversion (the kernel's `crc32(0, buf, len)`). This is the bitwise
/// complement of a standard CRC-32 engine started from an all-ones register.
pub fn sigma_crc32(data: &[u8]) -> u32 {
    // crc32fast inverts on entry and exit; seeding with !0 leaves the raw
    // register at zero, and the final complement undoes the exit inversion.
    let mut hasher = crc32fast::Hasher::new_with_initial(!0);
    hasher.update(data);
    !hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bitwise reference implementation of the kernel's `crc32_le`.
    fn reference(data: &[u8]) -> u32 {
        let mut crc = 0u32;
        for &byte in data {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
            }
        }
        crc
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(sigma_crc32(&[]), 0);
    }

    #[test]
    fn test_matches_reference() {
        let data: Vec<u8> = (0..=255u8).chain(0..17).collect();
        assert_eq!(sigma_crc32(&data), reference(&data));
        assert_eq!(sigma_crc32(b"123456789"), reference(b"123456789"));
    }

    #[test]
    fn test_differs_from_standard_crc32() {
        // Standard CRC-32 of "123456789" is 0xCBF43926. Seeding the raw
        // register with zero instead of all ones gives a different value.
        assert_ne!(sigma_crc32(b"123456789"), 0xCBF4_3926);
    }
}
