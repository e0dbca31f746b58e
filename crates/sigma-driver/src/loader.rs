//! Firmware load entry points

use crate::bus::SigmaBus;
use crate::clock::Clock;
use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use crate::executor::{Executor, LoadReport};
use crate::provider::FirmwareProvider;
use tracing::info;

/// Validate and execute an already-loaded firmware blob.
///
/// Header, version and checksum are verified before the first bus call.
///
/// # Errors
///
/// Returns [`LoadError::Format`] for malformed blobs and
/// [`LoadError::Action`] for the first action that fails.
pub fn load_firmware<B: SigmaBus, C: Clock>(
    blob: &[u8],
    bus: B,
    clock: C,
    config: &LoaderConfig,
) -> Result<LoadReport> {
    let firmware = sigma_firmware::validate(blob)?;
    Executor::new(bus, clock, config).run(&firmware)
}

/// Fetch firmware `name` from `provider` and execute it.
///
/// # Errors
///
/// Returns [`LoadError::FirmwareUnavailable`] if the provider fails, and
/// otherwise the same errors as [`load_firmware`].
pub fn process_sigma_firmware<P, B, C>(
    provider: &P,
    name: &str,
    bus: B,
    clock: C,
    config: &LoaderConfig,
) -> Result<LoadReport>
where
    P: FirmwareProvider + ?Sized,
    B: SigmaBus,
    C: Clock,
{
    info!("Loading SigmaDSP firmware {name}");

    let blob = provider
        .load(name)
        .map_err(|source| LoadError::FirmwareUnavailable {
            name: name.to_string(),
            source,
        })?;

    load_firmware(&blob, bus, clock, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, VirtualDsp};
    use bytes::Bytes;
    use sigma_firmware::FirmwareBuilder;
    use std::collections::HashMap;

    #[test]
    fn test_missing_firmware() {
        let provider: HashMap<String, Bytes> = HashMap::new();
        let mut dsp = VirtualDsp::new();
        let err = process_sigma_firmware(
            &provider,
            "adau1701.bin",
            &mut dsp,
            ManualClock::new(),
            &LoaderConfig::linux_compatible(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::FirmwareUnavailable { ref name, .. } if name == "adau1701.bin"
        ));
        assert!(dsp.transactions().is_empty());
    }

    #[test]
    fn test_named_load() {
        let blob = FirmwareBuilder::new().write_single(0x0002, &[0x7F]).end().build();
        let mut provider = HashMap::new();
        provider.insert("dsp.bin".to_string(), Bytes::from(blob));

        let mut dsp = VirtualDsp::new();
        let report = process_sigma_firmware(
            &provider,
            "dsp.bin",
            &mut dsp,
            ManualClock::new(),
            &LoaderConfig::linux_compatible(),
        )
        .unwrap();
        assert_eq!(report.actions_executed, 1);
        assert_eq!(dsp.register(0x0002), Some(&[0x7F][..]));
    }
}
