//! `sigma`: command-line tool for SigmaStudio DSP firmware.
//!
//! ```text
//! USAGE:
//!   sigma inspect <firmware>         Validate and list every action
//!   sigma verify <firmware>          Check header, version and CRC only
//!   sigma dry-run <firmware> --delay-unit <us|ms>
//!                                    Execute against a virtual DSP
//!   sigma locate <name>              Resolve a name through the search path
//! ```
//!
//! `<firmware>` is a file path if one exists, otherwise a name looked up in
//! `SIGMA_FIRMWARE_PATH`, `/lib/firmware/updates` and `/lib/firmware`.

mod firmware_search;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use firmware_search::FirmwareSearch;
use sigma_chip::format::HEADER_LEN;
use sigma_driver::{
    BusTransaction, DelayUnit, FirmwareProvider, LoaderConfig, ManualClock, PllPoll, VirtualDsp,
};
use sigma_firmware::{validate, Opcode};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sigma", about = "SigmaStudio DSP firmware tool", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Validate a firmware blob and list its actions.
    Inspect {
        /// Path or firmware name (e.g. adau1701.bin).
        firmware: String,
    },
    /// Check magic, version and CRC without decoding actions.
    Verify {
        /// Path or firmware name.
        firmware: String,
    },
    /// Execute a firmware blob against an in-memory DSP and print every bus call.
    DryRun {
        /// Path or firmware name.
        firmware: String,
        /// Unit of DELAY lengths (us for the Linux loader convention).
        #[arg(long)]
        delay_unit: DelayUnit,
        /// Report PLL lock from this poll onwards (1-based).
        #[arg(long, default_value_t = 1)]
        pll_lock_after: u32,
        /// Maximum PLL status polls per PLLWAIT.
        #[arg(long, default_value_t = 100)]
        pll_attempts: u32,
    },
    /// Print where a firmware name resolves to.
    Locate {
        /// Firmware name.
        name: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Inspect { firmware } => cmd_inspect(&firmware)?,
        Cmd::Verify { firmware } => cmd_verify(&firmware)?,
        Cmd::DryRun {
            firmware,
            delay_unit,
            pll_lock_after,
            pll_attempts,
        } => cmd_dry_run(&firmware, delay_unit, pll_lock_after, pll_attempts)?,
        Cmd::Locate { name } => cmd_locate(&name)?,
    }

    Ok(())
}

/// Read `firmware` as a path if it exists, otherwise through the search path.
fn read_firmware(firmware: &str) -> Result<Bytes> {
    let path = Path::new(firmware);
    if path.is_file() {
        let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        return Ok(Bytes::from(data));
    }

    FirmwareSearch::from_env()
        .load(firmware)
        .with_context(|| format!("loading firmware '{firmware}'"))
}

fn cmd_verify(firmware: &str) -> Result<()> {
    let blob = read_firmware(firmware)?;
    let fw = validate(&blob)?;
    let header = fw.header();

    println!("Firmware     : {firmware}");
    println!("Size         : {} bytes", blob.len());
    println!("Version      : {}", header.version);
    println!("CRC          : {:#010x} (ok)", header.crc);
    Ok(())
}

fn cmd_inspect(firmware: &str) -> Result<()> {
    let blob = read_firmware(firmware)?;
    let fw = validate(&blob)?;

    println!("Firmware     : {firmware}");
    println!(
        "Version {}  CRC {:#010x}  {} payload bytes",
        fw.header().version,
        fw.header().crc,
        fw.payload().len()
    );
    println!();
    println!("{:>5}  {:>6}  {:<14}  {:>6}  {:>8}", "#", "offset", "action", "addr", "len");

    for action in fw.actions() {
        let action = action?;
        let detail = match action.opcode {
            Opcode::Delay => format!("{} ticks", action.length),
            Opcode::PllWait | Opcode::Noop | Opcode::End => String::new(),
            _ => preview(action.payload),
        };
        println!(
            "{:>5}  {:>6}  {:<14}  {:#06x}  {:>8}  {detail}",
            action.index,
            HEADER_LEN + action.offset,
            action.opcode.name(),
            action.address,
            action.length,
        );
    }

    let summary = fw.summarize()?;
    println!();
    println!(
        "{} actions, {} payload bytes, {} delay ticks",
        summary.actions, summary.payload_bytes, summary.delay_ticks
    );
    for opcode in Opcode::ALL {
        let count = summary.count(opcode);
        if count > 0 {
            println!("  {:<14} {count}", opcode.name());
        }
    }
    if summary.trailing_bytes > 0 {
        println!("  {} bytes after END (ignored)", summary.trailing_bytes);
    }
    Ok(())
}

fn cmd_dry_run(
    firmware: &str,
    delay_unit: DelayUnit,
    pll_lock_after: u32,
    pll_attempts: u32,
) -> Result<()> {
    let blob = read_firmware(firmware)?;

    let pll = PllPoll::adau17x1().with_budget(Duration::from_millis(1), pll_attempts);
    let config = LoaderConfig::new(delay_unit).with_pll(pll);
    let mut dsp = VirtualDsp::new().with_pll_lock_after(pll_lock_after);
    let mut clock = ManualClock::new();

    let outcome = sigma_driver::load_firmware(&blob, &mut dsp, &mut clock, &config);

    for (i, transaction) in dsp.transactions().iter().enumerate() {
        match transaction {
            BusTransaction::Write { address, data } => {
                println!("{i:>5}  W {address:#06x}  {}", preview(data));
            }
            BusTransaction::Read { address, len } => {
                println!("{i:>5}  R {address:#06x}  {len} bytes");
            }
        }
    }
    println!();
    println!("Virtual time : {:?} (delay unit {delay_unit})", clock.elapsed());

    let report = outcome?;
    println!(
        "Loaded       : {} actions, {} writes ({} bytes), {} safeload commits, {} PLL polls",
        report.actions_executed,
        report.bus_writes,
        report.bytes_written,
        report.safeload_commits,
        report.pll_polls
    );
    Ok(())
}

fn cmd_locate(name: &str) -> Result<()> {
    let search = FirmwareSearch::from_env();
    match search.locate(name) {
        Ok(path) => println!("{}", path.display()),
        Err(err) => {
            for dir in search.dirs() {
                eprintln!("  searched {}", dir.display());
            }
            return Err(err).with_context(|| format!("locating '{name}'"));
        }
    }
    Ok(())
}

/// Hex preview of at most 16 bytes.
fn preview(data: &[u8]) -> String {
    const MAX: usize = 16;
    let mut out = data
        .iter()
        .take(MAX)
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    if data.len() > MAX {
        out.push_str(&format!(" … (+{})", data.len() - MAX));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dry_run_args() {
        let cli = Cli::parse_from(["sigma", "dry-run", "fw.bin", "--delay-unit", "ms"]);
        match cli.command {
            Cmd::DryRun {
                delay_unit,
                pll_attempts,
                ..
            } => {
                assert_eq!(delay_unit, DelayUnit::Milliseconds);
                assert_eq!(pll_attempts, 100);
            }
            _ => panic!("expected dry-run"),
        }
    }

    #[test]
    fn test_dry_run_requires_delay_unit() {
        assert!(Cli::try_parse_from(["sigma", "dry-run", "fw.bin"]).is_err());
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview(&[0x7F, 0x00]), "7f 00");
        assert!(preview(&[0u8; 20]).ends_with("(+4)"));
    }
}
