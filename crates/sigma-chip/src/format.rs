//! SigmaStudio firmware container format.
//!
//! ```text
//! Header (12 bytes):
//!   0..7   magic     "ADISIGM"
//!   7      version   u8 (only 1 is defined)
//!   8..12  crc       u32, little-endian, over every byte after the header
//!
//! Action record (6 bytes + payload):
//!   0      instr     u8
//!   1      len_hi    u8
//!   2..4   len_lo    u16, little-endian
//!   4..6   addr      u16, big-endian
//!   6..    payload   len bytes (write instructions only)
//!
//!   len = (len_hi << 16) | len_lo
//! ```
//!
//! The stream is a concatenation of action records terminated by an
//! `END` record. Bytes after `END` are never interpreted.

// ── Header ───────────────────────────────────────────────────────────────────

/// Magic literal at the start of every firmware blob.
pub const MAGIC: &[u8; 7] = b"ADISIGM";

/// Length of [`MAGIC`].
pub const MAGIC_LEN: usize = 7;

/// Offset of the version byte.
pub const VERSION_OFFSET: usize = 7;

/// Offset of the little-endian CRC word.
pub const CRC_OFFSET: usize = 8;

/// Total header size. Everything after this offset is covered by the CRC.
pub const HEADER_LEN: usize = 12;

/// The only container version the Linux loader accepts.
pub const SUPPORTED_VERSION: u8 = 1;

// ── Action record ────────────────────────────────────────────────────────────

/// Size of the fixed part of an action record.
pub const ACTION_HEADER_LEN: usize = 6;

/// Largest value the split 24-bit length field can hold.
pub const MAX_ACTION_LEN: u32 = 0x00FF_FFFF;

/// Raw instruction byte values.
pub mod instr {
    /// Write an arbitrary number of bytes in one transaction.
    pub const WRITEXBYTES: u8 = 0;
    /// Write a single parameter word.
    pub const WRITESINGLE: u8 = 1;
    /// Stage a parameter update through the safeload registers.
    pub const WRITESAFELOAD: u8 = 2;
    /// Wait for a fixed time.
    pub const DELAY: u8 = 3;
    /// Poll until the PLL reports lock.
    pub const PLLWAIT: u8 = 4;
    /// Do nothing.
    pub const NOOP: u8 = 5;
    /// End of stream.
    pub const END: u8 = 6;
}

/// Reassemble the split record length field.
#[must_use]
pub const fn action_len(len_hi: u8, len_lo: u16) -> u32 {
    ((len_hi as u32) << 16) | len_lo as u32
}

/// Split a 24-bit length into its `(len_hi, len_lo)` wire fields.
///
/// Bits above 24 are discarded.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn split_action_len(len: u32) -> (u8, u16) {
    (((len >> 16) & 0xFF) as u8, (len & 0xFFFF) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(MAGIC.len(), MAGIC_LEN);
        assert_eq!(VERSION_OFFSET, MAGIC_LEN);
        assert_eq!(CRC_OFFSET + 4, HEADER_LEN);
    }

    #[test]
    fn test_action_len_reassembly() {
        assert_eq!(action_len(0, 1), 1);
        assert_eq!(action_len(0x01, 0x0000), 0x1_0000);
        assert_eq!(action_len(0xFF, 0xFFFF), MAX_ACTION_LEN);
        assert_eq!(split_action_len(0x12_3456), (0x12, 0x3456));
    }

    #[test]
    fn test_instr_values_are_dense() {
        let all = [
            instr::WRITEXBYTES,
            instr::WRITESINGLE,
            instr::WRITESAFELOAD,
            instr::DELAY,
            instr::PLLWAIT,
            instr::NOOP,
            instr::END,
        ];
        for (i, v) in all.iter().enumerate() {
            assert_eq!(usize::from(*v), i);
        }
    }
}
