//! MIX structures and errors.

use std::mem::size_of;

use static_assertions::const_assert_eq;

use crate::utils::PathToStringError;

/// Size of a MIX body SHA1 checksum.
pub const CHECKSUM_SIZE: usize = 20;
/// Size of the serialized MIX header: file count and body size.
pub const HEADER_SIZE: usize = size_of::<u16>() + size_of::<u32>();
/// Size of a serialized MIX index entry.
pub const INDEX_ENTRY_SIZE: usize = 12;
/// Most files a MIX index can hold.
pub const MAX_FILE_COUNT: usize = u16::MAX as usize;
/// Index key of the XCC "local mix database.dat" entry under the C&C hash.
pub const LMD_KEY_CNC: i32 = 0x54C2D545;
/// Index key of the XCC "local mix database.dat" entry under CRC32.
pub const LMD_KEY_CRC32: i32 = 0x366E051F;

const_assert_eq!(size_of::<MixIndexEntry>(), INDEX_ENTRY_SIZE);

/// A 20 byte MIX body checksum.
pub type Checksum = [u8; CHECKSUM_SIZE];

/// The error type for operations on MIX files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An [`std::io::Error`].
    #[error("{0}")]
    IO(#[from] std::io::Error),
    /// An error from the pipe chain carrying the bytes.
    #[error("{0}")]
    Pipe(#[from] crate::pipe::Error),
    /// An error from the header encryption layer.
    #[error("{0}")]
    Crypto(#[from] crate::crypto::Error),
    /// A [`PathToStringError`].
    #[error("{0}")]
    PathToStringError(#[from] PathToStringError),
    /// The header or index is inconsistent.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(&'static str),
    /// The stored SHA1 digest does not match the body.
    #[error("MIX body does not match its stored SHA1 checksum")]
    ChecksumMismatch,
    /// Another entry already hashes to the same ID.
    #[error("{name} hashes to 0x{id:08X}, which is already in the index")]
    HashCollision { name: String, id: i32 },
    /// The file count or body size would exceed the format limits.
    #[error("MIX limit exceeded: {0}")]
    LimitExceeded(&'static str),
    /// The requested member is not in the index.
    #[error("{0} not found in the MIX index")]
    NotFound(String),
    /// The header is encrypted and no key was supplied.
    #[error("MIX header is encrypted, but no key was provided")]
    MissingKey,
}

mod flags {
    bitflags::bitflags! {
        /// MIX header flags describing the encryption/checksum extensions
        /// introduced with Red Alert.
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct MixHeaderFlags: u16 {
            /// A SHA1 digest of the body trails the archive.
            const CHECKSUM = 0x0001;
            /// The header and index are Blowfish encrypted.
            const ENCRYPTION = 0x0002;
            const _ = !0;
        }
    }
}

pub use flags::MixHeaderFlags;

impl From<u16> for MixHeaderFlags {
    fn from(value: u16) -> Self {
        Self::from_bits_retain(value)
    }
}

impl From<MixHeaderFlags> for u16 {
    fn from(value: MixHeaderFlags) -> Self {
        value.bits()
    }
}

/// A MIX index entry identifies and localizes one file in the MIX body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixIndexEntry {
    /// Hash of the uppercased file name.
    pub id: i32,
    /// Offset from the start of the MIX body.
    pub offset: u32,
    /// Size of this file in bytes.
    pub size: u32,
}

impl MixIndexEntry {
    pub fn new(id: i32, offset: u32, size: u32) -> Self {
        Self { id, offset, size }
    }

    /// Index order compares IDs as unsigned 32 bit patterns.
    pub fn sort_key(&self) -> u32 {
        self.id as u32
    }
}
