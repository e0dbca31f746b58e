//! SigmaDSP firmware loader.
//!
//! Executes SigmaStudio firmware blobs against a register bus: header and
//! checksum are validated up front, then each action is decoded and
//! dispatched in file order with its own timing and atomicity rules.
//!
//! # Layering
//!
//! ```text
//! FirmwareProvider ──bytes──▶ sigma_firmware::validate ──▶ Actions
//!                                                            │
//!                                     Executor<B: SigmaBus, C: Clock>
//!                                                            │
//!                                  I2C / regmap / VirtualDsp ◀┘
//! ```
//!
//! The transport is whatever implements [`SigmaBus`]; this crate ships only
//! [`VirtualDsp`], an in-memory model for dry runs and tests.
//!
//! # Quick start
//!
//! ```
//! use sigma_driver::{load_firmware, LoaderConfig, ManualClock, VirtualDsp};
//! use sigma_firmware::FirmwareBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let blob = FirmwareBuilder::new()
//!     .write_single(0x0002, &[0x7F])
//!     .end()
//!     .build();
//!
//! let mut dsp = VirtualDsp::new();
//! let config = LoaderConfig::linux_compatible();
//! let report = load_firmware(&blob, &mut dsp, ManualClock::new(), &config)?;
//!
//! assert_eq!(report.actions_executed, 1);
//! assert_eq!(dsp.register(0x0002), Some(&[0x7F][..]));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod bus;
mod clock;
mod config;
mod error;
mod executor;
mod loader;
mod provider;
mod virtual_dsp;

pub use bus::{SafeloadRegisters, SigmaBus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CancelFlag, DelayUnit, LoaderConfig, PllPoll};
pub use error::{BusError, LoadError, Result, RuntimeError};
pub use executor::{ExecState, Executor, Flow, LoadReport, StatusHandle};
pub use loader::{load_firmware, process_sigma_firmware};
pub use provider::FirmwareProvider;
pub use virtual_dsp::{BusTransaction, VirtualDsp};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        load_firmware, process_sigma_firmware, Clock, DelayUnit, FirmwareProvider, LoadError,
        LoadReport, LoaderConfig, ManualClock, PllPoll, Result, SigmaBus, SystemClock,
        VirtualDsp,
    };
}
