//! The two hash functions used for file indexing in MIX archives.
//!
//! Neither scheme is a plain checksum over the raw bytes: both consume the
//! input in 4 byte chunks and give a short trailing chunk special
//! treatment, so streaming engines have to buffer up to 3 bytes.

use std::mem::size_of;

/// Hash scheme used to address files inside a MIX.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HashMethod {
    /// Rotate-and-add hash used by TD and RA1.
    #[default]
    Cnc,
    /// IEEE CRC32 with tail padding, used by TS and later.
    Crc32,
}

impl HashMethod {
    /// Hash a filename with this scheme. Names are uppercased first.
    pub fn hash(&self, name: impl AsRef<str>) -> i32 {
        let name = name.as_ref().to_uppercase();
        match self {
            HashMethod::Cnc => {
                let mut engine = CncHashEngine::new();
                engine.update(name.as_bytes());
                engine.value()
            }
            HashMethod::Crc32 => {
                let mut engine = Crc32Engine::new();
                engine.update(name.as_bytes());
                engine.value()
            }
        }
    }
}

impl std::fmt::Display for HashMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

/// Streaming rotate-and-add hash engine.
///
/// Every full little-endian chunk folds in as
/// `acc = rol(acc, 1) + chunk`; a final partial chunk is zero padded.
/// Westwood rolled this one themselves, it is not a real CRC.
#[derive(Clone, Debug, Default)]
pub struct CncHashEngine {
    acc: u32,
    buffer: [u8; 4],
    index: usize,
}

impl CncHashEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously finalized value.
    pub fn with_initial(initial: i32) -> Self {
        Self {
            acc: initial as u32,
            ..Self::default()
        }
    }

    /// Absorb a byte sequence. May be called repeatedly.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.buffer[self.index] = byte;
            self.index += 1;
            if self.index == size_of::<u32>() {
                self.acc = self
                    .acc
                    .rotate_left(1)
                    .wrapping_add(u32::from_le_bytes(self.buffer));
                self.buffer = [0u8; 4];
                self.index = 0;
            }
        }
    }

    /// Current hash value with any partial trailing chunk folded in.
    pub fn value(&self) -> i32 {
        if self.index == 0 {
            return self.acc as i32;
        }
        // Scratch bytes past the fill point are still zero.
        self.acc
            .rotate_left(1)
            .wrapping_add(u32::from_le_bytes(self.buffer)) as i32
    }
}

/// Streaming CRC32 engine with the 4 byte chunk discipline.
///
/// Full chunks feed a table-driven IEEE CRC32. A partial trailing chunk of
/// `r` bytes is completed to 4 before hashing: the tail bytes, then `r`
/// itself, then copies of the chunk's first byte.
#[derive(Clone, Debug, Default)]
pub struct Crc32Engine {
    hasher: crc32fast::Hasher,
    buffer: [u8; 4],
    index: usize,
}

impl Crc32Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously finalized value.
    pub fn with_initial(initial: i32) -> Self {
        Self {
            hasher: crc32fast::Hasher::new_with_initial(initial as u32),
            ..Self::default()
        }
    }

    /// Absorb a byte sequence. May be called repeatedly.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.buffer[self.index] = byte;
            self.index += 1;
            if self.index == size_of::<u32>() {
                self.hasher.update(&self.buffer);
                self.index = 0;
            }
        }
    }

    /// Current hash value with any partial trailing chunk folded in.
    pub fn value(&self) -> i32 {
        let mut hasher = self.hasher.clone();
        if self.index != 0 {
            let mut tail = [self.buffer[0]; 4];
            tail[..self.index].copy_from_slice(&self.buffer[..self.index]);
            tail[self.index] = self.index as u8;
            hasher.update(&tail);
        }
        hasher.finalize() as i32
    }
}
