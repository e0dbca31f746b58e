//! Silicon and wire-format model for Analog Devices SigmaDSP parts.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure description of the things every other crate in the workspace needs
//! to agree on: the SigmaStudio firmware container layout and the register
//! addresses the loader touches on ADAU1701 and ADAU17x1 devices.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`format`] | Firmware header and action record layout, opcode byte values |
//! | [`regs`] | Safeload, core control and PLL registers for supported parts |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod format;
pub mod regs;
