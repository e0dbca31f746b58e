//! Error types for firmware execution

use crate::executor::ExecState;
use sigma_firmware::{FormatError, Opcode};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Failure reported by a bus transport
#[derive(Debug, Error)]
pub enum BusError {
    /// Device did not acknowledge the transfer
    #[error("No acknowledge from device at {address:#06x}")]
    Nack {
        /// Register address of the failed transfer
        address: u16,
    },

    /// Transfer failed for a transport-specific reason
    #[error("Transfer failed: {reason}")]
    TransferFailed {
        /// Reason for failure
        reason: String,
    },

    /// I/O error from the underlying transport
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl BusError {
    /// Create a no-acknowledge error
    pub const fn nack(address: u16) -> Self {
        Self::Nack { address }
    }

    /// Create a transfer failed error
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            reason: reason.into(),
        }
    }
}

/// Errors raised while executing a single action
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A bus write was rejected
    #[error("Bus write failed: {source}")]
    BusWriteFailed {
        /// Transport error
        #[source]
        source: BusError,
    },

    /// A bus read was rejected
    #[error("Bus read failed: {source}")]
    BusReadFailed {
        /// Transport error
        #[source]
        source: BusError,
    },

    /// PLL never reported lock within the poll budget
    #[error("PLL did not lock after {attempts} polls ({waited:?})")]
    PllLockTimeout {
        /// Number of status reads issued
        attempts: u32,
        /// Time spent sleeping between polls
        waited: Duration,
    },

    /// Safeload payload does not fit the device's safeload registers
    #[error("Safeload payload of {len} bytes exceeds capacity of {capacity} bytes")]
    SafeloadTooLarge {
        /// Payload length
        len: usize,
        /// Declared capacity in bytes
        capacity: usize,
    },

    /// Safeload payload is not a whole number of parameter words
    #[error("Safeload payload of {len} bytes is not a multiple of the {word_len}-byte word size")]
    SafeloadMisaligned {
        /// Payload length
        len: usize,
        /// Parameter word length
        word_len: usize,
    },

    /// Load was cancelled between actions
    #[error("Load cancelled")]
    Cancelled,

    /// `PllPoll` can never report lock
    #[error(
        "Invalid PLL poll settings: lock byte {lock_byte} outside {status_len}-byte status, {max_attempts} attempts"
    )]
    InvalidPllPoll {
        /// Bytes read per poll
        status_len: usize,
        /// Byte holding the lock bit
        lock_byte: usize,
        /// Poll budget
        max_attempts: u32,
    },

    /// Action offered to an executor that already reached `Done` or `Failed`
    #[error("Executor is {state:?}; no further actions run")]
    Finished {
        /// Terminal state of the executor
        state: ExecState,
    },
}

impl RuntimeError {
    /// True if the action issued at least one bus transaction before failing.
    ///
    /// Capacity and alignment checks run before any bus access.
    pub const fn touched_bus(&self) -> bool {
        matches!(
            self,
            Self::BusWriteFailed { .. } | Self::BusReadFailed { .. } | Self::PllLockTimeout { .. }
        )
    }
}

/// Errors that abort a firmware load
#[derive(Debug, Error)]
pub enum LoadError {
    /// Firmware blob is malformed
    #[error("Invalid firmware: {0}")]
    Format(#[from] FormatError),

    /// An action failed during execution
    #[error("Action {index} ({opcode}) at {address:#06x} failed: {source}")]
    Action {
        /// Zero-based action index
        index: usize,
        /// Instruction being executed
        opcode: Opcode,
        /// Target register
        address: u16,
        /// What went wrong
        #[source]
        source: RuntimeError,
    },

    /// The firmware provider could not supply the named blob
    #[error("Firmware {name} unavailable: {source}")]
    FirmwareUnavailable {
        /// Requested firmware name
        name: String,
        /// Provider error
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Create an action failure
    pub const fn action(index: usize, opcode: Opcode, address: u16, source: RuntimeError) -> Self {
        Self::Action {
            index,
            opcode,
            address,
            source,
        }
    }

    /// Index of the failing action, if the failure belongs to one.
    pub const fn action_index(&self) -> Option<usize> {
        match self {
            Self::Action { index, .. } => Some(*index),
            Self::Format(err) => err.action_index(),
            Self::FirmwareUnavailable { .. } => None,
        }
    }

    /// Opcode of the failing action, if it was decoded.
    pub const fn opcode(&self) -> Option<Opcode> {
        match self {
            Self::Action { opcode, .. } => Some(*opcode),
            Self::Format(err) => err.opcode(),
            Self::FirmwareUnavailable { .. } => None,
        }
    }

    /// Raw instruction byte, for records with an undefined opcode.
    pub const fn raw_opcode(&self) -> Option<u8> {
        match self {
            Self::Format(err) => err.raw_opcode(),
            _ => None,
        }
    }

    /// Register address involved in the failure, if known.
    pub const fn address(&self) -> Option<u16> {
        match self {
            Self::Action { address, .. } => Some(*address),
            Self::Format(err) => err.address(),
            Self::FirmwareUnavailable { .. } => None,
        }
    }

    /// The runtime cause, for failures during execution.
    pub const fn runtime(&self) -> Option<&RuntimeError> {
        match self {
            Self::Action { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_diagnostics() {
        let err = LoadError::action(
            3,
            Opcode::WriteSafeload,
            0x0010,
            RuntimeError::SafeloadTooLarge { len: 24, capacity: 20 },
        );
        assert_eq!(err.action_index(), Some(3));
        assert_eq!(err.opcode(), Some(Opcode::WriteSafeload));
        assert_eq!(err.address(), Some(0x0010));
        let msg = err.to_string();
        assert!(msg.contains("WRITESAFELOAD"));
        assert!(msg.contains("0x0010"));
    }

    #[test]
    fn test_format_error_diagnostics() {
        let err = LoadError::from(FormatError::UnknownOpcode {
            index: 2,
            offset: 12,
            byte: 0x09,
            address: 0x0800,
        });
        assert_eq!(err.action_index(), Some(2));
        assert_eq!(err.opcode(), None);
        assert_eq!(err.raw_opcode(), Some(0x09));
        assert_eq!(err.address(), Some(0x0800));
    }

    #[test]
    fn test_precheck_errors_do_not_touch_bus() {
        assert!(!RuntimeError::SafeloadTooLarge { len: 1, capacity: 0 }.touched_bus());
        assert!(!RuntimeError::Cancelled.touched_bus());
        assert!(!RuntimeError::Finished {
            state: ExecState::Done
        }
        .touched_bus());
        assert!(RuntimeError::BusReadFailed {
            source: BusError::nack(0x4002)
        }
        .touched_bus());
    }
}
