//! Register addresses the firmware loader touches.
//!
//! Values come from the ADAU1701 and ADAU1761 datasheets. Only the
//! registers involved in safeload staging and PLL lock detection are
//! listed; parameter and program RAM contents are opaque to the loader.

/// ADAU1701 / ADAU1702 / ADAU1401 register map.
pub mod adau1701 {
    // ── Memories ─────────────────────────────────────────────────────────────

    /// Parameter RAM base (1024 words × 4 bytes).
    pub const PARAM_RAM: u16 = 0x0000;
    /// Program RAM base (1024 words × 5 bytes).
    pub const PROGRAM_RAM: u16 = 0x0400;

    // ── Safeload ─────────────────────────────────────────────────────────────

    /// First safeload data register. Five consecutive registers.
    pub const SAFELOAD_DATA: u16 = 0x0810;
    /// First safeload target-address register. Five consecutive registers.
    pub const SAFELOAD_ADDR: u16 = 0x0815;
    /// Number of parameters one safeload transfer can carry.
    pub const SAFELOAD_SLOTS: u8 = 5;
    /// Width of a safeload data register in bytes.
    pub const SAFELOAD_DATA_WIDTH: u8 = 5;
    /// Width of one parameter word in the firmware payload (5.23 fixed point).
    pub const PARAM_WORD_LEN: u8 = 4;

    // ── Core control ─────────────────────────────────────────────────────────

    /// DSP core control register (2 bytes).
    pub const DSP_CORE_CONTROL: u16 = 0x081C;

    /// Core control bit definitions
    pub mod core_control {
        /// Initiate safeload transfer.
        pub const IST: u16 = 1 << 5;
        /// Clear internal registers to zero (active low).
        pub const CR: u16 = 1 << 2;
    }
}

/// ADAU1361 / ADAU1761 / ADAU1781 register map.
pub mod adau17x1 {
    /// PLL control register (6 bytes, big-endian fields).
    pub const PLL_CONTROL: u16 = 0x4002;
    /// Length of the PLL control register.
    pub const PLL_CONTROL_LEN: usize = 6;
    /// Byte within [`PLL_CONTROL`] carrying the lock and enable bits.
    pub const PLL_STATUS_BYTE: usize = 5;

    /// PLL control byte 5 bit definitions
    pub mod pll_status {
        /// PLL enable.
        pub const ENABLE: u8 = 1 << 0;
        /// PLL lock (read only).
        pub const LOCK: u8 = 1 << 1;
    }
}
