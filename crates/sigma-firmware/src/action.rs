//! Decoded action records

use crate::Opcode;
use sigma_chip::format::ACTION_HEADER_LEN;

/// One decoded instruction.
///
/// `payload` borrows directly from the firmware blob. For `Delay` the
/// `length` field is a wait count and for `PllWait` the `address` field
/// is the status register to poll; neither consumes payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRecord<'a> {
    /// Zero-based position in the stream
    pub index: usize,

    /// Byte offset of the record within the payload (after the header)
    pub offset: usize,

    /// Instruction
    pub opcode: Opcode,

    /// 24-bit length field, `(len_hi << 16) | len_lo`
    pub length: u32,

    /// Register address (big-endian on the wire)
    pub address: u16,

    /// Payload bytes, empty for non-write instructions
    pub payload: &'a [u8],
}

impl ActionRecord<'_> {
    /// Wait count for a `Delay` record.
    pub const fn delay_ticks(&self) -> Option<u32> {
        match self.opcode {
            Opcode::Delay => Some(self.length),
            _ => None,
        }
    }

    /// Status register for a `PllWait` record.
    pub const fn poll_target(&self) -> Option<u16> {
        match self.opcode {
            Opcode::PllWait => Some(self.address),
            _ => None,
        }
    }

    /// Bytes this record occupies in the stream.
    pub const fn encoded_len(&self) -> usize {
        ACTION_HEADER_LEN + self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinterpreted_fields() {
        let delay = ActionRecord {
            index: 0,
            offset: 0,
            opcode: Opcode::Delay,
            length: 500,
            address: 0,
            payload: &[],
        };
        assert_eq!(delay.delay_ticks(), Some(500));
        assert_eq!(delay.poll_target(), None);

        let wait = ActionRecord {
            opcode: Opcode::PllWait,
            address: 0x4002,
            length: 0,
            ..delay
        };
        assert_eq!(wait.poll_target(), Some(0x4002));
        assert_eq!(wait.delay_ticks(), None);
        assert_eq!(wait.encoded_len(), ACTION_HEADER_LEN);
    }
}
