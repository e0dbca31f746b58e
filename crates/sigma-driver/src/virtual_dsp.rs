//! In-memory SigmaDSP
//!
//! Implements [`SigmaBus`] over a register file instead of hardware. This
//! enables:
//!
//! 1. **Dry runs**: execute a firmware blob and inspect every transaction
//!    it would issue, without a device attached.
//!
//! 2. **CI without hardware**: the loader's tests run against this model.
//!
//! ## Model
//!
//! - Writes are logged and stored by start address (last write wins).
//! - Safeload behaves like an ADAU1701: writes to the staging registers are
//!   held until the core control register is written with `IST` set, then
//!   every staged word is applied to its target address at once.
//! - Reads of the ADAU17x1 PLL control register report lock from the
//!   configured poll onwards. Other reads return stored bytes, zero-padded.
//! - Faults can be injected per address.

use crate::bus::{SafeloadRegisters, SigmaBus};
use crate::error::BusError;
use sigma_chip::regs::adau17x1;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

/// One logged bus call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusTransaction {
    /// Register write
    Write {
        /// Start address
        address: u16,
        /// Bytes written
        data: Vec<u8>,
    },
    /// Register read
    Read {
        /// Start address
        address: u16,
        /// Bytes requested
        len: usize,
    },
}

/// Register-file model of a SigmaDSP.
#[derive(Debug, Clone)]
pub struct VirtualDsp {
    registers: BTreeMap<u16, Vec<u8>>,
    log: Vec<BusTransaction>,
    safeload: Option<SafeloadRegisters>,
    staged: BTreeMap<u8, (Option<Vec<u8>>, Option<u16>)>,
    commits: usize,
    pll_lock_after: Option<u32>,
    pll_polls: u32,
    failing_writes: HashSet<u16>,
    failing_reads: HashSet<u16>,
}

impl Default for VirtualDsp {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDsp {
    /// ADAU1701-style safeload, PLL locks on the first poll.
    pub fn new() -> Self {
        Self {
            registers: BTreeMap::new(),
            log: Vec::new(),
            safeload: Some(SafeloadRegisters::adau1701()),
            staged: BTreeMap::new(),
            commits: 0,
            pll_lock_after: Some(1),
            pll_polls: 0,
            failing_writes: HashSet::new(),
            failing_reads: HashSet::new(),
        }
    }

    /// Report PLL lock starting with poll number `polls` (1-based).
    #[must_use]
    pub fn with_pll_lock_after(mut self, polls: u32) -> Self {
        self.pll_lock_after = Some(polls);
        self
    }

    /// PLL never locks.
    #[must_use]
    pub fn with_pll_never_locking(mut self) -> Self {
        self.pll_lock_after = None;
        self
    }

    /// Use a different safeload layout.
    #[must_use]
    pub fn with_safeload(mut self, regs: SafeloadRegisters) -> Self {
        self.safeload = Some(regs);
        self
    }

    /// Declare no safeload support.
    #[must_use]
    pub fn without_safeload(mut self) -> Self {
        self.safeload = None;
        self
    }

    /// Fail every write that starts at `address`.
    #[must_use]
    pub fn fail_writes_to(mut self, address: u16) -> Self {
        self.failing_writes.insert(address);
        self
    }

    /// Fail every read that starts at `address`.
    #[must_use]
    pub fn fail_reads_from(mut self, address: u16) -> Self {
        self.failing_reads.insert(address);
        self
    }

    /// Every bus call, in order.
    pub fn transactions(&self) -> &[BusTransaction] {
        &self.log
    }

    /// Logged writes as `(address, data)` pairs.
    pub fn writes(&self) -> impl Iterator<Item = (u16, &[u8])> {
        self.log.iter().filter_map(|t| match t {
            BusTransaction::Write { address, data } => Some((*address, data.as_slice())),
            BusTransaction::Read { .. } => None,
        })
    }

    /// Number of logged reads.
    pub fn read_count(&self) -> usize {
        self.log
            .iter()
            .filter(|t| matches!(t, BusTransaction::Read { .. }))
            .count()
    }

    /// Last bytes stored at `address`.
    pub fn register(&self, address: u16) -> Option<&[u8]> {
        self.registers.get(&address).map(Vec::as_slice)
    }

    /// Safeload transfers applied so far.
    pub const fn safeload_commits(&self) -> usize {
        self.commits
    }

    /// PLL status polls seen so far.
    pub const fn pll_polls(&self) -> u32 {
        self.pll_polls
    }

    fn slot_of(base: u16, slots: u8, address: u16) -> Option<u8> {
        let offset = address.checked_sub(base)?;
        u8::try_from(offset).ok().filter(|slot| *slot < slots)
    }

    /// Route writes that hit the safeload block. Returns true if consumed.
    fn stage_safeload(&mut self, address: u16, data: &[u8]) -> bool {
        let Some(regs) = self.safeload else {
            return false;
        };

        if let Some(slot) = Self::slot_of(regs.data_base, regs.slots, address) {
            let word_len = usize::from(regs.word_len);
            let word = data[data.len().saturating_sub(word_len)..].to_vec();
            self.staged.entry(slot).or_default().0 = Some(word);
            return true;
        }

        if let Some(slot) = Self::slot_of(regs.address_base, regs.slots, address) {
            if let [hi, lo] = data {
                self.staged.entry(slot).or_default().1 = Some(u16::from_be_bytes([*hi, *lo]));
            }
            return true;
        }

        if address == regs.commit_address {
            let value = match data {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                _ => 0,
            };
            if value & regs.commit_value == regs.commit_value {
                self.commit_safeload();
            }
            self.registers.insert(address, data.to_vec());
            return true;
        }

        false
    }

    fn commit_safeload(&mut self) {
        for (slot, staged) in std::mem::take(&mut self.staged) {
            if let (Some(word), Some(target)) = staged {
                trace!("Safeload slot {slot} -> {target:#06x}");
                self.registers.insert(target, word);
            }
        }
        self.commits += 1;
        debug!("Safeload commit #{}", self.commits);
    }

    fn pll_status(&mut self, buf: &mut [u8]) {
        self.pll_polls += 1;
        let locked = self
            .pll_lock_after
            .is_some_and(|after| self.pll_polls >= after);
        if let Some(byte) = buf.get_mut(adau17x1::PLL_STATUS_BYTE) {
            *byte |= adau17x1::pll_status::ENABLE;
            if locked {
                *byte |= adau17x1::pll_status::LOCK;
            } else {
                *byte &= !adau17x1::pll_status::LOCK;
            }
        }
    }
}

impl SigmaBus for VirtualDsp {
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError> {
        self.log.push(BusTransaction::Write {
            address,
            data: data.to_vec(),
        });

        if self.failing_writes.contains(&address) {
            return Err(BusError::nack(address));
        }

        if !self.stage_safeload(address, data) {
            self.registers.insert(address, data.to_vec());
        }
        Ok(())
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        self.log.push(BusTransaction::Read {
            address,
            len: buf.len(),
        });

        if self.failing_reads.contains(&address) {
            return Err(BusError::nack(address));
        }

        buf.fill(0);
        if let Some(stored) = self.registers.get(&address) {
            let n = stored.len().min(buf.len());
            buf[..n].copy_from_slice(&stored[..n]);
        }

        if address == adau17x1::PLL_CONTROL {
            self.pll_status(buf);
        }
        Ok(())
    }

    fn safeload_registers(&self) -> Option<SafeloadRegisters> {
        self.safeload
    }
}
