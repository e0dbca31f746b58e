//! Firmware provider seam
//!
//! The loader never touches storage itself. Whatever supplies firmware by
//! name (a platform firmware facility, a directory search, an embedded
//! table) implements [`FirmwareProvider`].

use bytes::Bytes;
use std::collections::HashMap;
use std::io;

/// Supplies firmware blobs by name.
pub trait FirmwareProvider {
    /// Fetch the complete blob for `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such firmware exists, or any I/O error the
    /// backing store reports.
    fn load(&self, name: &str) -> io::Result<Bytes>;
}

impl<F> FirmwareProvider for F
where
    F: Fn(&str) -> io::Result<Bytes>,
{
    fn load(&self, name: &str) -> io::Result<Bytes> {
        self(name)
    }
}

impl FirmwareProvider for HashMap<String, Bytes> {
    fn load(&self, name: &str) -> io::Result<Bytes> {
        self.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no firmware named {name}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_provider() {
        let mut map = HashMap::new();
        map.insert("dsp.bin".to_string(), Bytes::from_static(b"ADISIGM"));
        assert_eq!(map.load("dsp.bin").unwrap(), Bytes::from_static(b"ADISIGM"));
        assert_eq!(
            map.load("missing.bin").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_closure_provider() {
        let provider = |name: &str| -> io::Result<Bytes> { Ok(Bytes::from(name.as_bytes().to_vec())) };
        assert_eq!(provider.load("abc").unwrap().as_ref(), b"abc");
    }
}
