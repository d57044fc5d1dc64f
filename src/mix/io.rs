//! MIX reading and writing through pipe and straw chains.
//!
//! Writing streams everything through a pipe chain built bottom-up on the
//! stack: file pipe at the sink, optionally a SHA1 pipe for the body
//! checksum, optionally a PK pipe encrypting the header. Reading mirrors
//! this with straws: file straw, cache straw, optionally a PK straw.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use sha1::{Digest, Sha1};

use crate::crc::HashMethod;
use crate::crypto::{self, KeyPair, PKey, BLOWFISH_BLOCK_SIZE, WRAPPED_KEY_SIZE};
use crate::mix::{
    Checksum, Error, MixHeaderFlags, MixIndexEntry, CHECKSUM_SIZE, HEADER_SIZE, INDEX_ENTRY_SIZE,
    MAX_FILE_COUNT,
};
use crate::pipe::{CacheStraw, FilePipe, FileStraw, Pipe, PkPipe, PkStraw, Sha1Pipe, Straw};
use crate::utils::path_to_filename;

type Result<T> = std::result::Result<T, Error>;

/// Chunk size for streaming file bodies into an archive.
const WRITE_CHUNK: usize = 1024;
/// Chunk size for copying member files out of an archive.
const EXTRACT_CHUNK: usize = 2048;

/// Where a queued file's bytes come from at serialization time.
#[derive(Debug)]
enum SourceKind {
    Disk(PathBuf),
    Memory(Vec<u8>),
}

/// One file queued for packaging.
#[derive(Debug)]
struct QueuedFile {
    entry: MixIndexEntry,
    source: SourceKind,
}

/// Byte counts reported after an archive has been written.
#[derive(Clone, Copy, Debug, Default)]
pub struct MixWriteInfo {
    /// Flag word, header and index bytes, including encryption overhead.
    pub header_size: usize,
    /// Body bytes as they reached the sink.
    pub body_size: usize,
    /// Number of files in the index.
    pub file_count: usize,
}

/// Accumulates an index of files, then streams them out as a MIX archive.
///
/// The index is serialized sorted by hash; bodies follow in the order the
/// files were added. Both orders matter: the former is what lookup
/// binary-searches, the latter keeps the body layout predictable.
pub struct MixBuilder {
    files: IndexMap<i32, QueuedFile>,
    hash_method: HashMethod,
    has_checksum: bool,
    encryption: Option<KeyPair>,
    force_flags: bool,
    body_size: u64,
}

impl MixBuilder {
    pub fn new(
        hash_method: HashMethod,
        has_checksum: bool,
        encryption: Option<KeyPair>,
        force_flags: bool,
    ) -> Self {
        Self {
            files: IndexMap::new(),
            hash_method,
            has_checksum,
            encryption,
            force_flags,
            body_size: 0,
        }
    }

    /// Queue a file from disk. The entry ID is the hash of the uppercased
    /// file name; the contents are read when the archive is written.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        let name = path_to_filename(path)?;
        let entry = self.reserve(&name, size)?;
        self.files.insert(
            entry.id,
            QueuedFile {
                entry,
                source: SourceKind::Disk(path.to_path_buf()),
            },
        );
        self.body_size += size;
        Ok(())
    }

    /// Queue a file from an in-memory buffer under the given name.
    pub fn add_data(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let size = data.len() as u64;
        let entry = self.reserve(name, size)?;
        self.files.insert(
            entry.id,
            QueuedFile {
                entry,
                source: SourceKind::Memory(data),
            },
        );
        self.body_size += size;
        Ok(())
    }

    /// Queue every regular file in one directory level, in enumerator
    /// order. Files that cannot be added are logged and skipped.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        for res in std::fs::read_dir(dir)? {
            let path = res?.path();
            if path.is_dir() {
                continue;
            }
            if let Err(err) = self.add_file(&path) {
                log::warn!("Skipping {}: {}", path.display(), err);
            }
        }
        Ok(())
    }

    /// Drop a previously queued file by name or path. Later entries slide
    /// down so the body stays gapless.
    pub fn remove_file(&mut self, name: impl AsRef<Path>) -> Result<()> {
        let name = path_to_filename(name)?;
        let id = self.hash_method.hash(&name);
        if self.files.shift_remove(&id).is_none() {
            return Err(Error::NotFound(name));
        }
        let mut offset = 0u64;
        for file in self.files.values_mut() {
            file.entry.offset = offset as u32;
            offset += u64::from(file.entry.size);
        }
        self.body_size = offset;
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn body_size(&self) -> u64 {
        self.body_size
    }

    /// Check limits and hash the name, producing the index entry for a
    /// new file at the current end of the body.
    fn reserve(&self, name: &str, size: u64) -> Result<MixIndexEntry> {
        if self.files.len() == MAX_FILE_COUNT {
            return Err(Error::LimitExceeded("the index is full at 65535 files"));
        }
        if self.body_size + size > u64::from(u32::MAX) {
            return Err(Error::LimitExceeded("body size would pass 4 GiB"));
        }
        let id = self.hash_method.hash(name);
        if self.files.contains_key(&id) {
            return Err(Error::HashCollision {
                name: name.to_string(),
                id,
            });
        }
        Ok(MixIndexEntry::new(id, self.body_size as u32, size as u32))
    }

    fn flags(&self) -> MixHeaderFlags {
        let mut flags = MixHeaderFlags::default();
        if self.has_checksum {
            flags.insert(MixHeaderFlags::CHECKSUM);
        }
        if self.encryption.is_some() {
            flags.insert(MixHeaderFlags::ENCRYPTION);
        }
        flags
    }

    /// Serialize the archive into `out`.
    pub fn write_mix<W: Write>(&self, out: W) -> Result<MixWriteInfo> {
        let mut flpipe = FilePipe::new(out);
        let flags = self.flags();
        let mut header_size = 0;

        // The flag word is stored in the clear, straight to the file pipe.
        if !flags.is_empty() || self.force_flags {
            header_size += flpipe.put(&0u16.to_le_bytes())?;
            header_size += flpipe.put(&u16::from(flags).to_le_bytes())?;
        }

        let mut sorted: Vec<&MixIndexEntry> = self.files.values().map(|f| &f.entry).collect();
        sorted.sort_by_key(|entry| entry.sort_key());

        // Header and index, encrypted when requested. The header is never
        // part of the body checksum.
        header_size += if let Some(keys) = &self.encryption {
            let session_key = crypto::generate_key(&mut rand::thread_rng());
            let mut pkpipe = PkPipe::new(&mut flpipe, &keys.private, session_key);
            let put = Self::put_header_and_index(&mut pkpipe, &sorted, self.body_size as u32)?;
            put + pkpipe.flush()?
        } else {
            Self::put_header_and_index(&mut flpipe, &sorted, self.body_size as u32)?
        };

        // Bodies go out in the order files were added, not index order.
        let mut body_size = 0;
        if self.has_checksum {
            let mut shpipe = Sha1Pipe::new(&mut flpipe);
            for file in self.files.values() {
                body_size += Self::put_body(file, &mut shpipe)?;
            }
            let digest = shpipe.digest();
            flpipe.put(&digest)?;
        } else {
            for file in self.files.values() {
                body_size += Self::put_body(file, &mut flpipe)?;
            }
        }
        flpipe.flush()?;

        Ok(MixWriteInfo {
            header_size,
            body_size,
            file_count: self.files.len(),
        })
    }

    fn put_header_and_index(
        pipe: &mut dyn Pipe,
        index: &[&MixIndexEntry],
        body_size: u32,
    ) -> Result<usize> {
        let mut put = 0;
        put += pipe.put(&(index.len() as u16).to_le_bytes())?;
        put += pipe.put(&body_size.to_le_bytes())?;
        for entry in index {
            put += pipe.put(&entry.id.to_le_bytes())?;
            put += pipe.put(&entry.offset.to_le_bytes())?;
            put += pipe.put(&entry.size.to_le_bytes())?;
        }
        Ok(put)
    }

    fn put_body(file: &QueuedFile, pipe: &mut dyn Pipe) -> Result<usize> {
        match &file.source {
            SourceKind::Memory(data) => Ok(pipe.put(data)?),
            SourceKind::Disk(path) => {
                log::info!("Writing file {}", path.display());
                let mut reader = File::open(path)?;
                let mut buffer = [0u8; WRITE_CHUNK];
                let mut total = 0;
                loop {
                    let read = reader.read(&mut buffer)?;
                    if read == 0 {
                        break;
                    }
                    total += pipe.put(&buffer[..read])?;
                }
                Ok(total)
            }
        }
    }
}

/// A parsed MIX archive over a seekable source.
///
/// The header and index are consumed once at `open`; afterwards members
/// are random-accessed by hash.
#[derive(Debug)]
pub struct MixArchive<R> {
    source: R,
    flags: MixHeaderFlags,
    has_flags_word: bool,
    index: Vec<MixIndexEntry>,
    declared_body_size: u32,
    body_start: u64,
    checksum: Option<Checksum>,
}

impl<R: Read + Seek> MixArchive<R> {
    /// Parse the header and index. `key` is the public half needed for
    /// archives with encrypted headers.
    pub fn open(mut source: R, key: Option<&PKey>) -> Result<Self> {
        let (has_flags_word, flags, declared_body_size, mut index) = {
            let mut fstraw = FileStraw::new(&mut source);
            let mut cache = CacheStraw::new(&mut fstraw);

            let mut word = [0u8; 2];
            cache.get_exact(&mut word)?;
            let first = u16::from_le_bytes(word);

            // A zero first word cannot be a file count of a meaningful
            // archive, so it marks the flagged (>= RA) layout.
            let (has_flags_word, flags) = if first == 0 {
                cache.get_exact(&mut word)?;
                (true, MixHeaderFlags::from(u16::from_le_bytes(word)))
            } else {
                (false, MixHeaderFlags::default())
            };

            let (body_size, index) = if flags.contains(MixHeaderFlags::ENCRYPTION) {
                let key = key.ok_or(Error::MissingKey)?;
                let mut pkstraw = PkStraw::new(&mut cache, key);
                Self::get_header_and_index(&mut pkstraw, None)?
            } else if has_flags_word {
                Self::get_header_and_index(&mut cache, None)?
            } else {
                Self::get_header_and_index(&mut cache, Some(first))?
            };
            (has_flags_word, flags, body_size, index)
        };

        // The index is stored sorted; enforce rather than trust it.
        index.sort_by_key(MixIndexEntry::sort_key);
        if index.windows(2).any(|pair| pair[0].id == pair[1].id) {
            return Err(Error::CorruptArchive("duplicate hash in the index"));
        }
        for entry in &index {
            if u64::from(entry.offset) + u64::from(entry.size) > u64::from(declared_body_size) {
                return Err(Error::CorruptArchive("index entry points past the body"));
            }
        }

        let header_bytes = HEADER_SIZE + index.len() * INDEX_ENTRY_SIZE;
        let mut body_start = if has_flags_word { 4u64 } else { 0u64 };
        body_start += if flags.contains(MixHeaderFlags::ENCRYPTION) {
            (WRAPPED_KEY_SIZE + header_bytes.next_multiple_of(BLOWFISH_BLOCK_SIZE)) as u64
        } else {
            header_bytes as u64
        };

        let body_end = body_start + u64::from(declared_body_size);
        let file_len = source.seek(SeekFrom::End(0))?;
        let checksum = if flags.contains(MixHeaderFlags::CHECKSUM) {
            if body_end + CHECKSUM_SIZE as u64 > file_len {
                return Err(Error::CorruptArchive("checksum tail is missing"));
            }
            let mut digest = [0u8; CHECKSUM_SIZE];
            source.seek(SeekFrom::Start(body_end))?;
            source.read_exact(&mut digest)?;
            Some(digest)
        } else {
            if body_end > file_len {
                return Err(Error::CorruptArchive("body extends past the end of the file"));
            }
            None
        };

        Ok(Self {
            source,
            flags,
            has_flags_word,
            index,
            declared_body_size,
            body_start,
            checksum,
        })
    }

    fn get_header_and_index(
        straw: &mut dyn Straw,
        known_count: Option<u16>,
    ) -> Result<(u32, Vec<MixIndexEntry>)> {
        let mut buf = [0u8; 4];
        let file_count = match known_count {
            Some(count) => count,
            None => {
                straw.get_exact(&mut buf[..2])?;
                u16::from_le_bytes([buf[0], buf[1]])
            }
        };
        straw.get_exact(&mut buf)?;
        let body_size = u32::from_le_bytes(buf);

        let mut index = Vec::with_capacity(file_count as usize);
        for _ in 0..file_count {
            straw.get_exact(&mut buf)?;
            let id = i32::from_le_bytes(buf);
            straw.get_exact(&mut buf)?;
            let offset = u32::from_le_bytes(buf);
            straw.get_exact(&mut buf)?;
            let size = u32::from_le_bytes(buf);
            index.push(MixIndexEntry::new(id, offset, size));
        }
        Ok((body_size, index))
    }

    pub fn file_count(&self) -> u16 {
        self.index.len() as u16
    }

    pub fn flags(&self) -> MixHeaderFlags {
        self.flags
    }

    /// Whether the archive uses the flagged (>= RA) header layout.
    pub fn has_flags_word(&self) -> bool {
        self.has_flags_word
    }

    pub fn body_size(&self) -> u32 {
        self.declared_body_size
    }

    /// The sorted index.
    pub fn index(&self) -> &[MixIndexEntry] {
        &self.index
    }

    pub fn has_checksum(&self) -> bool {
        self.checksum.is_some()
    }

    /// Look up an entry by ID via binary search over the sorted index.
    pub fn find(&self, id: i32) -> Option<&MixIndexEntry> {
        self.index
            .binary_search_by_key(&(id as u32), MixIndexEntry::sort_key)
            .ok()
            .map(|at| &self.index[at])
    }

    /// Absolute position and size of a member within the archive file.
    pub fn offset(&self, id: i32) -> Option<(u64, u32)> {
        self.find(id)
            .map(|entry| (self.body_start + u64::from(entry.offset), entry.size))
    }

    /// Copy one member into `out`.
    pub fn extract(&mut self, id: i32, out: &mut dyn Write) -> Result<u64> {
        let (start, size) = self
            .offset(id)
            .ok_or_else(|| Error::NotFound(format!("{:0>8X}", id)))?;
        self.source.seek(SeekFrom::Start(start))?;
        let mut remaining = u64::from(size);
        let mut buffer = [0u8; EXTRACT_CHUNK];
        while remaining > 0 {
            let take = remaining.min(EXTRACT_CHUNK as u64) as usize;
            self.source.read_exact(&mut buffer[..take])?;
            out.write_all(&buffer[..take])?;
            remaining -= take as u64;
        }
        Ok(u64::from(size))
    }

    /// Recompute the body SHA1 and compare it against the stored tail.
    pub fn verify_checksum(&mut self) -> Result<()> {
        let stored = self
            .checksum
            .ok_or(Error::CorruptArchive("archive carries no checksum"))?;
        self.source.seek(SeekFrom::Start(self.body_start))?;
        let mut hasher = Sha1::new();
        let mut remaining = u64::from(self.declared_body_size);
        let mut buffer = [0u8; WRITE_CHUNK];
        while remaining > 0 {
            let take = remaining.min(WRITE_CHUNK as u64) as usize;
            self.source.read_exact(&mut buffer[..take])?;
            hasher.update(&buffer[..take]);
            remaining -= take as u64;
        }
        let digest: Checksum = hasher.finalize().into();
        if digest != stored {
            return Err(Error::ChecksumMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{MixArchive, MixBuilder};
    use crate::crc::HashMethod;
    use crate::crypto::key_init;
    use crate::mix::{Error, MixHeaderFlags, HEADER_SIZE, INDEX_ENTRY_SIZE};
    use sha1::{Digest, Sha1};

    fn two_file_builder() -> MixBuilder {
        let mut builder = MixBuilder::new(HashMethod::Cnc, false, None, false);
        builder.add_data("a.bin", vec![0x01, 0x02, 0x03]).unwrap();
        builder.add_data("b.bin", vec![0xFF, 0xEE]).unwrap();
        builder
    }

    fn write_to_vec(builder: &MixBuilder) -> Vec<u8> {
        let mut out = Vec::new();
        builder.write_mix(&mut out).unwrap();
        out
    }

    #[test]
    fn plain_two_file_layout() {
        let id_a = HashMethod::Cnc.hash("a.bin");
        let id_b = HashMethod::Cnc.hash("b.bin");
        assert_eq!(id_a as u32, 0x92845CD0);
        assert_eq!(id_b as u32, 0x92845CD2);

        let out = write_to_vec(&two_file_builder());

        let mut expected = vec![0x02, 0x00, 0x05, 0x00, 0x00, 0x00];
        // a.bin hashes lower, so the sorted index starts with it; offsets
        // reflect insertion order, which here is the same.
        expected.extend_from_slice(&id_a.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.extend_from_slice(&id_b.to_le_bytes());
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&[0x01, 0x02, 0x03, 0xFF, 0xEE]);
        assert_eq!(out, expected);
    }

    #[test]
    fn plain_roundtrip() {
        let out = write_to_vec(&two_file_builder());
        let mut archive = MixArchive::open(Cursor::new(out), None).unwrap();
        assert_eq!(archive.file_count(), 2);
        assert!(!archive.has_flags_word());
        assert_eq!(archive.body_size(), 5);

        let id_a = HashMethod::Cnc.hash("a.bin");
        let mut extracted = Vec::new();
        archive.extract(id_a, &mut extracted).unwrap();
        assert_eq!(extracted, [0x01, 0x02, 0x03]);

        let id_b = HashMethod::Cnc.hash("b.bin");
        let mut extracted = Vec::new();
        archive.extract(id_b, &mut extracted).unwrap();
        assert_eq!(extracted, [0xFF, 0xEE]);

        assert!(archive.find(0x0BAD_F00D).is_none());
        let res = archive.extract(0x0BAD_F00D, &mut Vec::new());
        assert!(matches!(res, Err(Error::NotFound(_))));
    }

    #[test]
    fn index_is_sorted_unsigned() {
        let mut builder = MixBuilder::new(HashMethod::Cnc, false, None, false);
        // "1" hashes to 0x31 (positive), "a.bin" to 0x92845CD0 (negative
        // as i32). Unsigned order puts the positive one first.
        builder.add_data("a.bin", vec![1]).unwrap();
        builder.add_data("1", vec![2]).unwrap();
        let out = write_to_vec(&builder);
        let archive = MixArchive::open(Cursor::new(out), None).unwrap();
        let ids: Vec<u32> = archive.index().iter().map(|e| e.id as u32).collect();
        assert_eq!(ids, [0x31, 0x92845CD0]);
        // Insertion order still dictates the offsets.
        assert_eq!(archive.find(0x31).unwrap().offset, 1);
        assert_eq!(archive.find(0x92845CD0u32 as i32).unwrap().offset, 0);
    }

    #[test]
    fn flag_word_detection() {
        let mut forced = MixBuilder::new(HashMethod::Cnc, false, None, true);
        forced.add_data("a.bin", vec![0x01, 0x02, 0x03]).unwrap();
        let out = write_to_vec(&forced);
        assert_eq!(&out[..4], &[0x00, 0x00, 0x00, 0x00]);

        let archive = MixArchive::open(Cursor::new(out), None).unwrap();
        assert!(archive.has_flags_word());
        assert!(archive.flags().is_empty());
        assert_eq!(archive.file_count(), 1);

        // The unflagged rendition holds the same index, shifted 4 bytes.
        let mut plain = MixBuilder::new(HashMethod::Cnc, false, None, false);
        plain.add_data("a.bin", vec![0x01, 0x02, 0x03]).unwrap();
        let plain_archive =
            MixArchive::open(Cursor::new(write_to_vec(&plain)), None).unwrap();
        assert_eq!(plain_archive.index(), archive.index());
        let id = HashMethod::Cnc.hash("a.bin");
        let (flagged_at, _) = archive.offset(id).unwrap();
        let (plain_at, _) = plain_archive.offset(id).unwrap();
        assert_eq!(flagged_at, plain_at + 4);
    }

    #[test]
    fn encrypted_roundtrip() {
        let keys = key_init();
        let mut builder = MixBuilder::new(HashMethod::Cnc, false, Some(keys.clone()), false);
        builder.add_data("a.dat", vec![1, 2, 3, 4]).unwrap();
        builder.add_data("b.dat", vec![5, 6]).unwrap();
        builder.add_data("c.dat", vec![7]).unwrap();
        let out = write_to_vec(&builder);

        // Flag word in the clear, then the wrapped key, then the header
        // and index padded to Blowfish blocks, then the body.
        assert_eq!(&out[..4], &[0x00, 0x00, 0x02, 0x00]);
        let header_bytes = HEADER_SIZE + 3 * INDEX_ENTRY_SIZE;
        let expected_len = 4 + 80 + header_bytes.next_multiple_of(8) + 7;
        assert_eq!(out.len(), expected_len);

        let mut archive = MixArchive::open(Cursor::new(out), Some(&keys.public)).unwrap();
        assert!(archive.flags().contains(MixHeaderFlags::ENCRYPTION));
        assert_eq!(archive.file_count(), 3);
        assert_eq!(archive.body_size(), 7);
        for (name, data) in [
            ("a.dat", vec![1u8, 2, 3, 4]),
            ("b.dat", vec![5, 6]),
            ("c.dat", vec![7]),
        ] {
            let mut extracted = Vec::new();
            archive
                .extract(HashMethod::Cnc.hash(name), &mut extracted)
                .unwrap();
            assert_eq!(extracted, data, "{name} did not survive the roundtrip");
        }
    }

    #[test]
    fn encrypted_archive_needs_a_key() {
        let keys = key_init();
        let mut builder = MixBuilder::new(HashMethod::Cnc, false, Some(keys), false);
        builder.add_data("a.dat", vec![1]).unwrap();
        let out = write_to_vec(&builder);
        let res = MixArchive::open(Cursor::new(out), None);
        assert!(matches!(res, Err(Error::MissingKey)));
    }

    #[test]
    fn checksum_verifies_and_detects_damage() {
        let mut builder = MixBuilder::new(HashMethod::Cnc, true, None, false);
        builder.add_data("a.bin", vec![0x01, 0x02, 0x03]).unwrap();
        builder.add_data("b.bin", vec![0xFF, 0xEE]).unwrap();
        let out = write_to_vec(&builder);

        assert_eq!(&out[..4], &[0x00, 0x00, 0x01, 0x00]);
        let digest: [u8; 20] = Sha1::digest([0x01, 0x02, 0x03, 0xFF, 0xEE]).into();
        assert_eq!(&out[out.len() - 20..], &digest);

        let mut archive = MixArchive::open(Cursor::new(out.clone()), None).unwrap();
        assert!(archive.has_checksum());
        assert!(archive.verify_checksum().is_ok());

        let mut damaged = out;
        let body_at = damaged.len() - 20 - 5;
        damaged[body_at] ^= 0xFF;
        let mut archive = MixArchive::open(Cursor::new(damaged), None).unwrap();
        let res = archive.verify_checksum();
        assert!(matches!(res, Err(Error::ChecksumMismatch)));
    }

    #[test]
    fn checksum_and_encryption_combine() {
        let keys = key_init();
        let mut builder = MixBuilder::new(HashMethod::Crc32, true, Some(keys.clone()), false);
        builder.add_data("rules.ini", b"[General]".to_vec()).unwrap();
        let out = write_to_vec(&builder);
        assert_eq!(&out[..4], &[0x00, 0x00, 0x03, 0x00]);

        let mut archive = MixArchive::open(Cursor::new(out), Some(&keys.public)).unwrap();
        assert!(archive.verify_checksum().is_ok());
        let mut extracted = Vec::new();
        archive
            .extract(HashMethod::Crc32.hash("rules.ini"), &mut extracted)
            .unwrap();
        assert_eq!(extracted, b"[General]");
    }

    #[test]
    fn collisions_and_limits_are_errors() {
        let mut builder = two_file_builder();
        let res = builder.add_data("a.bin", vec![9]);
        assert!(matches!(res, Err(Error::HashCollision { .. })));
        // The failed add left no trace.
        assert_eq!(builder.file_count(), 2);
        assert_eq!(builder.body_size(), 5);

        let res = builder.add_data("huge.bin", Vec::new());
        assert!(res.is_ok());
        let mut builder = MixBuilder::new(HashMethod::Cnc, false, None, false);
        builder.add_data("big.one", vec![0; 16]).unwrap();
        // Faking a near-limit body via many adds would be silly; the size
        // guard math is checked directly instead.
        builder.body_size = u64::from(u32::MAX) - 8;
        let res = builder.add_data("big.two", vec![0; 16]);
        assert!(matches!(res, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn remove_file_closes_the_gap() {
        let mut builder = MixBuilder::new(HashMethod::Cnc, false, None, false);
        builder.add_data("a.dat", vec![1, 2, 3, 4]).unwrap();
        builder.add_data("b.dat", vec![5, 6]).unwrap();
        builder.add_data("c.dat", vec![7]).unwrap();
        builder.remove_file("b.dat").unwrap();
        assert_eq!(builder.file_count(), 2);
        assert_eq!(builder.body_size(), 5);

        let res = builder.remove_file("b.dat");
        assert!(matches!(res, Err(Error::NotFound(_))));

        let out = write_to_vec(&builder);
        let mut archive = MixArchive::open(Cursor::new(out), None).unwrap();
        let mut extracted = Vec::new();
        archive
            .extract(HashMethod::Cnc.hash("c.dat"), &mut extracted)
            .unwrap();
        assert_eq!(extracted, [7]);
    }

    #[test]
    fn open_rejects_duplicate_ids() {
        let mut raw = vec![0x02, 0x00, 0x02, 0x00, 0x00, 0x00];
        for _ in 0..2 {
            raw.extend_from_slice(&0x11223344u32.to_le_bytes());
            raw.extend_from_slice(&0u32.to_le_bytes());
            raw.extend_from_slice(&1u32.to_le_bytes());
        }
        raw.extend_from_slice(&[0xAA, 0xBB]);
        let res = MixArchive::open(Cursor::new(raw), None);
        assert!(matches!(res, Err(Error::CorruptArchive(_))));
    }

    #[test]
    fn open_rejects_entries_past_the_body() {
        let mut raw = vec![0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        raw.extend_from_slice(&0x11223344u32.to_le_bytes());
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&3u32.to_le_bytes());
        raw.extend_from_slice(&[0xAA, 0xBB]);
        let res = MixArchive::open(Cursor::new(raw), None);
        assert!(matches!(res, Err(Error::CorruptArchive(_))));
    }

    #[test]
    fn open_rejects_truncated_bodies() {
        let out = write_to_vec(&two_file_builder());
        let truncated = out[..out.len() - 1].to_vec();
        let res = MixArchive::open(Cursor::new(truncated), None);
        assert!(matches!(res, Err(Error::CorruptArchive(_))));
    }

    #[test]
    fn add_files_from_disk() {
        let dir = std::env::temp_dir().join(format!("mixkit-io-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("first.dat"), [1, 2, 3]).unwrap();
        std::fs::write(dir.join("second.dat"), [4, 5]).unwrap();
        std::fs::create_dir_all(dir.join("nested")).unwrap();

        let mut builder = MixBuilder::new(HashMethod::Cnc, false, None, false);
        builder.add_dir(&dir).unwrap();
        assert_eq!(builder.file_count(), 2);
        assert_eq!(builder.body_size(), 5);

        let out = write_to_vec(&builder);
        let mut archive = MixArchive::open(Cursor::new(out), None).unwrap();
        let mut extracted = Vec::new();
        archive
            .extract(HashMethod::Cnc.hash("first.dat"), &mut extracted)
            .unwrap();
        assert_eq!(extracted, [1, 2, 3]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
