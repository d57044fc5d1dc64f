//! Hasher plumbing for maps keyed by values that already are hashes.

/// A [`std::hash::Hasher`] that passes 32 bit keys straight through.
/// MIX IDs are hashes themselves, so scrambling them again buys nothing.
#[derive(Default)]
pub struct PrehashedKeyHasher(u64);

impl std::hash::Hasher for PrehashedKeyHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, _bytes: &[u8]) {
        unimplemented!("only i32 keys are supported")
    }

    fn write_i32(&mut self, i: i32) {
        self.0 = i as u64;
    }
}

/// A [`std::hash::BuildHasherDefault`] over [`PrehashedKeyHasher`].
pub type BuildPrehashedHasher = std::hash::BuildHasherDefault<PrehashedKeyHasher>;
