//! Error types for firmware parsing

use crate::Opcode;
use thiserror::Error;

/// Result type alias for firmware parsing
pub type Result<T> = std::result::Result<T, FormatError>;

/// Structural problems found while validating or decoding a firmware blob
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Blob is shorter than the fixed header
    #[error("Firmware truncated: {len} bytes, header needs {needed}")]
    Truncated {
        /// Actual blob length
        len: usize,
        /// Minimum length required
        needed: usize,
    },

    /// Header does not start with `"ADISIGM"`
    #[error("Invalid firmware magic: {found:02x?}")]
    MagicMismatch {
        /// The first seven bytes of the blob
        found: [u8; 7],
    },

    /// Container version is not one this loader understands
    #[error("Unsupported firmware version: {version}")]
    UnsupportedVersion {
        /// Version byte from the header
        version: u8,
    },

    /// Stored checksum does not match the payload
    #[error("Firmware CRC mismatch: header says {stored:#010x}, payload is {computed:#010x}")]
    CrcMismatch {
        /// CRC stored in the header
        stored: u32,
        /// CRC computed over the payload
        computed: u32,
    },

    /// An action record runs past the end of the blob
    #[error("Action {index} at offset {offset} truncated: needs {needed} bytes, {remaining} remain")]
    TruncatedAction {
        /// Zero-based action index
        index: usize,
        /// Payload offset of the record
        offset: usize,
        /// Bytes the record declares (fixed part plus payload)
        needed: usize,
        /// Bytes left in the blob at `offset`
        remaining: usize,
        /// Instruction, if the fixed part was complete
        opcode: Option<Opcode>,
        /// Target register, if the fixed part was complete
        address: Option<u16>,
    },

    /// Instruction byte outside the defined set
    #[error("Action {index} at offset {offset}: unknown opcode {byte:#04x}")]
    UnknownOpcode {
        /// Zero-based action index
        index: usize,
        /// Payload offset of the record
        offset: usize,
        /// The raw instruction byte
        byte: u8,
        /// Address field of the record
        address: u16,
    },

    /// Write instruction with nothing to write
    #[error("Action {index} at offset {offset}: write to {address:#06x} has an empty payload")]
    EmptyPayload {
        /// Zero-based action index
        index: usize,
        /// Payload offset of the record
        offset: usize,
        /// Target register
        address: u16,
    },

    /// Stream ended without an `End` record
    #[error("Firmware ended after {actions} actions without an END record")]
    MissingEnd {
        /// Number of complete actions decoded
        actions: usize,
    },
}

impl FormatError {
    /// Index of the action the error belongs to, if it is a per-action error.
    pub const fn action_index(&self) -> Option<usize> {
        match self {
            Self::TruncatedAction { index, .. }
            | Self::UnknownOpcode { index, .. }
            | Self::EmptyPayload { index, .. } => Some(*index),
            Self::MissingEnd { actions } => Some(*actions),
            Self::Truncated { .. }
            | Self::MagicMismatch { .. }
            | Self::UnsupportedVersion { .. }
            | Self::CrcMismatch { .. } => None,
        }
    }

    /// Instruction of the failing record, if it was decoded.
    pub const fn opcode(&self) -> Option<Opcode> {
        match self {
            Self::TruncatedAction { opcode, .. } => *opcode,
            _ => None,
        }
    }

    /// Address field of the failing record, if it was decoded.
    pub const fn address(&self) -> Option<u16> {
        match self {
            Self::TruncatedAction { address, .. } => *address,
            Self::UnknownOpcode { address, .. } | Self::EmptyPayload { address, .. } => {
                Some(*address)
            }
            _ => None,
        }
    }

    /// The raw instruction byte of an undefined opcode.
    pub const fn raw_opcode(&self) -> Option<u8> {
        match self {
            Self::UnknownOpcode { byte, .. } => Some(*byte),
            _ => None,
        }
    }

    /// True for errors detected on the whole blob before any action is decoded.
    pub const fn is_whole_blob(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::MagicMismatch { .. }
                | Self::UnsupportedVersion { .. }
                | Self::CrcMismatch { .. }
        )
    }
}
