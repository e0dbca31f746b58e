#![deny(unsafe_code)]

//! SigmaStudio firmware parser
//!
//! This crate validates and decodes the firmware blobs that SigmaStudio
//! exports for SigmaDSP parts. Parsing is a pure function of the buffer:
//! nothing here touches hardware.
//!
//! # Format
//!
//! - **Header** (12 bytes): `"ADISIGM"` magic, version byte, CRC-32 of the rest
//! - **Actions**: opcode-tagged records, each a 6-byte fixed part plus an
//!   optional payload, terminated by an `End` record
//!
//! See [`sigma_chip::format`] for the byte layout.
//!
//! # Example
//!
//! ```
//! use sigma_firmware::{validate, FirmwareBuilder, Opcode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let blob = FirmwareBuilder::new()
//!     .write_single(0x0002, &[0x7F])
//!     .end()
//!     .build();
//!
//! let firmware = validate(&blob)?;
//! for action in firmware.actions() {
//!     let action = action?;
//!     println!("{} {} @ {:#06x}", action.index, action.opcode, action.address);
//!     if action.opcode == Opcode::End {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod action;
mod builder;
mod checksum;
mod decoder;
mod error;
mod header;
mod opcode;

pub use action::ActionRecord;
pub use builder::FirmwareBuilder;
pub use checksum::sigma_crc32;
pub use decoder::{Actions, ProgramSummary};
pub use error::{FormatError, Result};
pub use header::{validate, FirmwareHeader, ValidatedFirmware};
pub use opcode::Opcode;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{validate, ActionRecord, FormatError, Opcode, Result, ValidatedFirmware};
}
