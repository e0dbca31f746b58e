//! Bus capability abstraction
//!
//! The executor never talks to a transport directly. Anything that can
//! write and read register-addressed bytes can run SigmaStudio firmware:
//! an I2C client, a regmap wrapper, a SPI bridge, or [`crate::VirtualDsp`].

use crate::error::BusError;
use sigma_chip::regs::adau1701;
use std::fmt::Debug;

/// Register-addressed bus to a SigmaDSP device.
///
/// The loader holds `&mut` access for the whole load, so one load owns
/// the device at a time. Implementations must not reorder or merge calls.
pub trait SigmaBus: Debug {
    /// Write `data` starting at register `address` as one transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the transport rejects the transfer.
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError>;

    /// Fill `buf` from register `address` as one transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the transport rejects the transfer.
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError>;

    /// Safeload register layout of the attached part.
    ///
    /// `None` means the part has no safeload mechanism; every
    /// `WRITESAFELOAD` action then exceeds a capacity of zero.
    fn safeload_registers(&self) -> Option<SafeloadRegisters> {
        None
    }
}

impl<B: SigmaBus + ?Sized> SigmaBus for &mut B {
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError> {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        (**self).read(address, buf)
    }

    fn safeload_registers(&self) -> Option<SafeloadRegisters> {
        (**self).safeload_registers()
    }
}

impl<B: SigmaBus + ?Sized> SigmaBus for Box<B> {
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError> {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        (**self).read(address, buf)
    }

    fn safeload_registers(&self) -> Option<SafeloadRegisters> {
        (**self).safeload_registers()
    }
}

/// Safeload staging registers declared by a bus.
///
/// A transfer stages up to `slots` parameter words: word `i` goes into
/// data register `data_base + i` and its target address into
/// `address_base + i`. A single write of `commit_value` to
/// `commit_address` then applies all staged words at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeloadRegisters {
    /// First data register
    pub data_base: u16,

    /// First target-address register
    pub address_base: u16,

    /// Number of staging slots
    pub slots: u8,

    /// Parameter word length in the firmware payload
    pub word_len: u8,

    /// Data register width; words are left-padded with zeros to this size
    pub data_width: u8,

    /// Register that triggers the transfer
    pub commit_address: u16,

    /// Value written (big-endian) to trigger the transfer
    pub commit_value: u16,
}

impl SafeloadRegisters {
    /// ADAU1701 safeload block: five 5-byte data slots, IST bit in core control.
    pub const fn adau1701() -> Self {
        Self {
            data_base: adau1701::SAFELOAD_DATA,
            address_base: adau1701::SAFELOAD_ADDR,
            slots: adau1701::SAFELOAD_SLOTS,
            word_len: adau1701::PARAM_WORD_LEN,
            data_width: adau1701::SAFELOAD_DATA_WIDTH,
            commit_address: adau1701::DSP_CORE_CONTROL,
            commit_value: adau1701::core_control::IST | adau1701::core_control::CR,
        }
    }

    /// Largest payload one safeload action may carry.
    pub const fn capacity(&self) -> usize {
        self.slots as usize * self.word_len as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adau1701_capacity() {
        let regs = SafeloadRegisters::adau1701();
        assert_eq!(regs.capacity(), 20);
        assert_eq!(regs.commit_address, 0x081C);
        assert_ne!(regs.commit_value & adau1701::core_control::IST, 0);
    }
}
