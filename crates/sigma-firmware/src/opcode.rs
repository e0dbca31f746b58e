//! Action opcodes

use sigma_chip::format::instr;
use std::fmt;

/// Instruction carried by an action record.
///
/// The set is closed: any other byte is rejected by the decoder with
/// [`crate::FormatError::UnknownOpcode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Write the whole payload at `address` in one bus transaction
    WriteXBytes,
    /// Write one parameter word at `address`
    WriteSingle,
    /// Stage the payload through the safeload registers and commit it
    WriteSafeload,
    /// Wait for `length` time units
    Delay,
    /// Poll the status register at `address` until the PLL locks
    PllWait,
    /// No operation
    Noop,
    /// End of the action stream
    End,
}

impl Opcode {
    /// All opcodes in wire order.
    pub const ALL: [Self; 7] = [
        Self::WriteXBytes,
        Self::WriteSingle,
        Self::WriteSafeload,
        Self::Delay,
        Self::PllWait,
        Self::Noop,
        Self::End,
    ];

    /// Map a raw instruction byte. Returns `None` for undefined values.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            instr::WRITEXBYTES => Some(Self::WriteXBytes),
            instr::WRITESINGLE => Some(Self::WriteSingle),
            instr::WRITESAFELOAD => Some(Self::WriteSafeload),
            instr::DELAY => Some(Self::Delay),
            instr::PLLWAIT => Some(Self::PllWait),
            instr::NOOP => Some(Self::Noop),
            instr::END => Some(Self::End),
            _ => None,
        }
    }

    /// Raw instruction byte.
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::WriteXBytes => instr::WRITEXBYTES,
            Self::WriteSingle => instr::WRITESINGLE,
            Self::WriteSafeload => instr::WRITESAFELOAD,
            Self::Delay => instr::DELAY,
            Self::PllWait => instr::PLLWAIT,
            Self::Noop => instr::NOOP,
            Self::End => instr::END,
        }
    }

    /// Whether the record's length field counts trailing payload bytes.
    pub const fn carries_payload(self) -> bool {
        matches!(self, Self::WriteXBytes | Self::WriteSingle | Self::WriteSafeload)
    }

    /// SigmaStudio mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::WriteXBytes => "WRITEXBYTES",
            Self::WriteSingle => "WRITESINGLE",
            Self::WriteSafeload => "WRITESAFELOAD",
            Self::Delay => "DELAY",
            Self::PllWait => "PLLWAIT",
            Self::Noop => "NOOP",
            Self::End => "END",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_byte(byte).ok_or(byte)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op.as_byte()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_total() {
        for byte in 0..=u8::MAX {
            match Opcode::try_from(byte) {
                Ok(op) => assert_eq!(op.as_byte(), byte),
                Err(raw) => {
                    assert_eq!(raw, byte);
                    assert!(byte > instr::END);
                }
            }
        }
    }

    #[test]
    fn test_payload_opcodes() {
        let with_payload: Vec<_> = Opcode::ALL
            .iter()
            .filter(|op| op.carries_payload())
            .collect();
        assert_eq!(
            with_payload,
            [&Opcode::WriteXBytes, &Opcode::WriteSingle, &Opcode::WriteSafeload]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::PllWait.to_string(), "PLLWAIT");
    }
}
