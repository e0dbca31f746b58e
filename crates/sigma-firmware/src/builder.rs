//! Programmatic construction of firmware blobs
//!
//! Used by tests and tooling to produce blobs with a correct header and
//! checksum without going through SigmaStudio.

use crate::{sigma_crc32, Opcode};
use sigma_chip::format::{split_action_len, HEADER_LEN, MAGIC, SUPPORTED_VERSION};

/// Builder for SigmaStudio firmware blobs.
#[derive(Debug, Clone)]
pub struct FirmwareBuilder {
    version: u8,
    body: Vec<u8>,
    crc: Option<u32>,
}

impl Default for FirmwareBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FirmwareBuilder {
    /// Empty version-1 blob.
    pub const fn new() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            body: Vec::new(),
            crc: None,
        }
    }

    /// Override the header version byte.
    #[must_use]
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Store this CRC instead of the computed one.
    #[must_use]
    pub fn crc(mut self, crc: u32) -> Self {
        self.crc = Some(crc);
        self
    }

    /// Append a record with explicit fields.
    ///
    /// `length` is written as-is, so it may disagree with `payload.len()`.
    #[must_use]
    pub fn action(mut self, opcode: Opcode, length: u32, address: u16, payload: &[u8]) -> Self {
        self.push_record(opcode.as_byte(), length, address, payload);
        self
    }

    /// Append a record with an arbitrary instruction byte.
    #[must_use]
    pub fn raw_action(mut self, instr: u8, length: u32, address: u16, payload: &[u8]) -> Self {
        self.push_record(instr, length, address, payload);
        self
    }

    /// `WRITEXBYTES` of `data` at `address`.
    #[must_use]
    pub fn write_bytes(self, address: u16, data: &[u8]) -> Self {
        self.write(Opcode::WriteXBytes, address, data)
    }

    /// `WRITESINGLE` of `data` at `address`.
    #[must_use]
    pub fn write_single(self, address: u16, data: &[u8]) -> Self {
        self.write(Opcode::WriteSingle, address, data)
    }

    /// `WRITESAFELOAD` of `data` starting at `address`.
    #[must_use]
    pub fn write_safeload(self, address: u16, data: &[u8]) -> Self {
        self.write(Opcode::WriteSafeload, address, data)
    }

    /// `DELAY` for `ticks` units.
    #[must_use]
    pub fn delay(self, ticks: u32) -> Self {
        self.action(Opcode::Delay, ticks, 0, &[])
    }

    /// `PLLWAIT` polling `address`.
    #[must_use]
    pub fn pll_wait(self, address: u16) -> Self {
        self.action(Opcode::PllWait, 0, address, &[])
    }

    /// `NOOP`.
    #[must_use]
    pub fn noop(self) -> Self {
        self.action(Opcode::Noop, 0, 0, &[])
    }

    /// `END`.
    #[must_use]
    pub fn end(self) -> Self {
        self.action(Opcode::End, 0, 0, &[])
    }

    /// Append raw bytes to the action stream.
    #[must_use]
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// Serialize header and body.
    pub fn build(&self) -> Vec<u8> {
        let crc = self.crc.unwrap_or_else(|| sigma_crc32(&self.body));
        let mut blob = Vec::with_capacity(HEADER_LEN + self.body.len());
        blob.extend_from_slice(MAGIC);
        blob.push(self.version);
        blob.extend_from_slice(&crc.to_le_bytes());
        blob.extend_from_slice(&self.body);
        blob
    }

    fn write(self, opcode: Opcode, address: u16, data: &[u8]) -> Self {
        let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
        self.action(opcode, len, address, data)
    }

    fn push_record(&mut self, instr: u8, length: u32, address: u16, payload: &[u8]) {
        let (hi, lo) = split_action_len(length);
        self.body.push(instr);
        self.body.push(hi);
        self.body.extend_from_slice(&lo.to_le_bytes());
        self.body.extend_from_slice(&address.to_be_bytes());
        self.body.extend_from_slice(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_blob_layout() {
        let blob = FirmwareBuilder::new().write_single(0x0002, &[0x7F]).end().build();
        assert_eq!(&blob[..7], b"ADISIGM");
        assert_eq!(blob[7], 1);
        assert_eq!(
            &blob[12..],
            &[1, 0, 1, 0, 0x00, 0x02, 0x7F, 6, 0, 0, 0, 0, 0]
        );
        let crc = u32::from_le_bytes([blob[8], blob[9], blob[10], blob[11]]);
        assert_eq!(crc, sigma_crc32(&blob[12..]));
    }

    #[test]
    fn test_crc_override() {
        let blob = FirmwareBuilder::new().crc(0xDEAD_BEEF).end().build();
        assert_eq!(&blob[8..12], &0xDEAD_BEEFu32.to_le_bytes());
    }
}
