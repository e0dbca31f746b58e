//! Firmware lookup on the local filesystem.
//!
//! Search order:
//! 1. Every directory in `SIGMA_FIRMWARE_PATH` (colon-separated)
//! 2. `/lib/firmware/updates`
//! 3. `/lib/firmware`

use bytes::Bytes;
use sigma_driver::FirmwareProvider;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Environment variable holding extra firmware directories.
pub const FIRMWARE_PATH_ENV: &str = "SIGMA_FIRMWARE_PATH";

/// Standard system firmware directories, highest priority first.
pub const SYSTEM_DIRS: [&str; 2] = ["/lib/firmware/updates", "/lib/firmware"];

/// Ordered list of directories searched for firmware by name.
#[derive(Debug, Clone)]
pub struct FirmwareSearch {
    dirs: Vec<PathBuf>,
}

impl FirmwareSearch {
    /// Search path from the environment plus the system directories.
    pub fn from_env() -> Self {
        let mut dirs = Vec::new();

        if let Some(custom) = std::env::var_os(FIRMWARE_PATH_ENV) {
            dirs.extend(std::env::split_paths(&custom).filter(|p| !p.as_os_str().is_empty()));
        }
        dirs.extend(SYSTEM_DIRS.iter().map(PathBuf::from));

        Self::with_dirs(dirs)
    }

    /// Search exactly `dirs`, in order.
    pub fn with_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
        }
    }

    /// Directories in search order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// First existing file called `name`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `name` tries to leave the search directories,
    /// `NotFound` if no directory contains it.
    pub fn locate(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid firmware name '{name}'"),
            ));
        }

        for dir in &self.dirs {
            let candidate = dir.join(relative);
            debug!("Checking {}", candidate.display());
            if candidate.is_file() {
                info!("Found firmware at {}", candidate.display());
                return Ok(candidate);
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "firmware '{name}' not found in {} director{}",
                self.dirs.len(),
                if self.dirs.len() == 1 { "y" } else { "ies" }
            ),
        ))
    }
}

impl FirmwareProvider for FirmwareSearch {
    fn load(&self, name: &str) -> io::Result<Bytes> {
        let path = self.locate(name)?;
        Ok(Bytes::from(std::fs::read(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_directory_wins() {
        let high = tempfile::tempdir().unwrap();
        let low = tempfile::tempdir().unwrap();
        std::fs::write(high.path().join("dsp.bin"), b"high").unwrap();
        std::fs::write(low.path().join("dsp.bin"), b"low").unwrap();
        std::fs::write(low.path().join("only-low.bin"), b"low").unwrap();

        let search =
            FirmwareSearch::with_dirs([high.path().to_path_buf(), low.path().to_path_buf()]);
        assert_eq!(search.load("dsp.bin").unwrap().as_ref(), b"high");
        assert_eq!(
            search.locate("only-low.bin").unwrap(),
            low.path().join("only-low.bin")
        );
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let search = FirmwareSearch::with_dirs([dir.path().to_path_buf()]);
        assert_eq!(
            search.locate("missing.bin").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_rejects_escaping_names() {
        let search = FirmwareSearch::with_dirs([PathBuf::from("/lib/firmware")]);
        for name in ["", "../etc/passwd", "/etc/passwd", "a/../../b"] {
            assert_eq!(
                search.locate(name).unwrap_err().kind(),
                io::ErrorKind::InvalidInput,
                "{name}"
            );
        }
    }

    #[test]
    fn test_system_dirs_come_last() {
        let search = FirmwareSearch::from_env();
        let tail: Vec<_> = search.dirs().iter().rev().take(2).collect();
        assert_eq!(tail[0], Path::new("/lib/firmware"));
        assert_eq!(tail[1], Path::new("/lib/firmware/updates"));
    }
}
