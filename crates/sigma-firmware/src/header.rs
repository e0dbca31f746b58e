//! Header validation and integrity check

use crate::decoder::Actions;
use crate::error::{FormatError, Result};
use crate::sigma_crc32;
use sigma_chip::format::{
    CRC_OFFSET, HEADER_LEN, MAGIC, MAGIC_LEN, SUPPORTED_VERSION, VERSION_OFFSET,
};

/// Parsed firmware header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareHeader {
    /// Container version
    pub version: u8,

    /// CRC stored in the header
    pub crc: u32,
}

/// A blob whose header, version and checksum have been verified.
///
/// Holds a borrowed view of the action stream; nothing is copied.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedFirmware<'a> {
    header: FirmwareHeader,
    payload: &'a [u8],
}

impl<'a> ValidatedFirmware<'a> {
    /// The parsed header.
    pub const fn header(&self) -> &FirmwareHeader {
        &self.header
    }

    /// Everything after the header.
    pub const fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// A fresh decoder over the action stream.
    pub fn actions(&self) -> Actions<'a> {
        Actions::new(self.payload)
    }
}

/// Validate the header and checksum of a firmware blob.
///
/// Pure pre-pass: all whole-blob errors are reported here, before any
/// action is decoded or executed.
///
/// # Errors
///
/// - [`FormatError::Truncated`] if the blob is shorter than the header
/// - [`FormatError::MagicMismatch`] if it does not start with `"ADISIGM"`
/// - [`FormatError::UnsupportedVersion`] for any version other than 1
/// - [`FormatError::CrcMismatch`] if the payload checksum differs
pub fn validate(blob: &[u8]) -> Result<ValidatedFirmware<'_>> {
    tracing::debug!("Validating firmware header ({} bytes)", blob.len());

    if blob.len() < HEADER_LEN {
        return Err(FormatError::Truncated {
            len: blob.len(),
            needed: HEADER_LEN,
        });
    }

    if &blob[..MAGIC_LEN] != MAGIC {
        let mut found = [0u8; MAGIC_LEN];
        found.copy_from_slice(&blob[..MAGIC_LEN]);
        tracing::error!("Invalid magic bytes: {:02x?}", found);
        return Err(FormatError::MagicMismatch { found });
    }

    let version = blob[VERSION_OFFSET];
    if version != SUPPORTED_VERSION {
        return Err(FormatError::UnsupportedVersion { version });
    }

    let crc = u32::from_le_bytes([
        blob[CRC_OFFSET],
        blob[CRC_OFFSET + 1],
        blob[CRC_OFFSET + 2],
        blob[CRC_OFFSET + 3],
    ]);

    let payload = &blob[HEADER_LEN..];
    let computed = sigma_crc32(payload);
    if computed != crc {
        return Err(FormatError::CrcMismatch {
            stored: crc,
            computed,
        });
    }

    tracing::debug!(
        "Firmware v{} valid: {} payload bytes, crc {:#010x}",
        version,
        payload.len(),
        crc
    );

    Ok(ValidatedFirmware {
        header: FirmwareHeader { version, crc },
        payload,
    })
}
