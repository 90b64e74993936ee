//! Vote salts and the randomness they are drawn from.

use std::fmt;
use std::sync::Mutex;

use rand::rngs::OsRng;
use rand::RngCore;

/// Two random bytes, hex-encoded to four characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoteSalt(String);

impl VoteSalt {
    pub const BYTES: usize = 2;

    pub fn from_bytes(bytes: [u8; Self::BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoteSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability that fills salt bytes.
pub trait SaltSource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error>;

    fn next_salt(&self) -> Result<VoteSalt, rand::Error> {
        let mut bytes = [0u8; VoteSalt::BYTES];
        self.fill(&mut bytes)?;
        Ok(VoteSalt::from_bytes(bytes))
    }
}

/// Operating-system randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSalt;

impl SaltSource for OsSalt {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

/// Deterministic source that counts upward; every call yields a new salt
/// until the 16-bit space wraps.
#[derive(Debug, Default)]
pub struct SequentialSalt {
    next: Mutex<u16>,
}

impl SequentialSalt {
    pub fn starting_at(start: u16) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl SaltSource for SequentialSalt {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let bytes = next.to_be_bytes();
        for (i, b) in dest.iter_mut().enumerate() {
            *b = bytes[i % bytes.len()];
        }
        *next = next.wrapping_add(1);
        Ok(())
    }
}
