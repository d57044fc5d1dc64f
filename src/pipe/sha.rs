//! Pass-through pipe that hashes everything flowing by.

use sha1::{Digest, Sha1};

use crate::pipe::{Pipe, Result};

/// Forwards every byte unchanged while keeping a running SHA1.
///
/// Used to compute the MIX body checksum without a second pass over the
/// input files.
pub struct Sha1Pipe<'a> {
    inner: &'a mut dyn Pipe,
    hasher: Sha1,
}

impl<'a> Sha1Pipe<'a> {
    pub fn new(inner: &'a mut dyn Pipe) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
        }
    }

    /// Digest of everything put through so far.
    pub fn digest(&self) -> [u8; 20] {
        self.hasher.clone().finalize().into()
    }
}

impl Pipe for Sha1Pipe<'_> {
    fn put(&mut self, data: &[u8]) -> Result<usize> {
        self.hasher.update(data);
        self.inner.put(data)
    }

    fn flush(&mut self) -> Result<usize> {
        self.inner.flush()
    }
}
