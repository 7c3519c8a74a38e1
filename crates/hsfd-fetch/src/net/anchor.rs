use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

const BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const END: &str = "-----END CERTIFICATE-----";

/// PEM certificate material the server chain must validate against.
///
/// Only these certificates are trusted; built-in roots are not consulted.
#[derive(Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pem: Arc<[u8]>,
    certificates: usize,
}

impl TrustAnchor {
    /// Accept PEM bytes holding at least one complete certificate block.
    pub fn from_pem(pem: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let pem = pem.into();
        let text = String::from_utf8_lossy(&pem);
        let certificates = count_blocks(&text);
        if certificates == 0 {
            return Err(ConfigError::NoCertificate);
        }
        Ok(Self {
            pem: Arc::from(pem),
            certificates,
        })
    }

    pub fn as_pem(&self) -> &[u8] { &self.pem }

    /// Number of certificate blocks in the bundle.
    pub fn certificates(&self) -> usize { self.certificates }
}

impl fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustAnchor")
            .field("certificates", &self.certificates)
            .field("bytes", &self.pem.len())
            .finish()
    }
}

fn count_blocks(text: &str) -> usize {
    let mut count = 0;
    let mut rest = text;
    while let Some(start) = rest.find(BEGIN) {
        let after = &rest[start + BEGIN.len()..];
        let Some(end) = after.find(END) else {
            break;
        };
        if after[..end].trim().is_empty() {
            break;
        }
        count += 1;
        rest = &after[end + END.len()..];
    }
    count
}
