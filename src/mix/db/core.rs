//! Name database structures and manipulation.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::crc::HashMethod;
use crate::utils::BuildPrehashedHasher;

/// A resolved reverse lookup: the file name and its description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameEntry {
    pub file_name: String,
    pub file_desc: String,
}

/// Everything known about one registered file name. A zero hash means
/// "not computed" (or nulled after a collision).
#[derive(Clone, Debug, Default)]
pub struct DataEntry {
    pub file_name: String,
    pub file_desc: String,
    pub cnc_hash: i32,
    pub crc32_hash: i32,
}

/// Bidirectional mapping between file names and their MIX hashes.
///
/// Names are primary; two derived maps keyed by each hash scheme answer
/// reverse lookups and are regenerated lazily after changes. When two
/// names collide under a scheme, the one registered later has its hash
/// nulled and only the first stays reachable by hash.
#[derive(Debug, Default)]
pub struct MixNameDatabase {
    names: IndexMap<String, DataEntry>,
    cnc_map: HashMap<i32, NameEntry, BuildPrehashedHasher>,
    crc32_map: HashMap<i32, NameEntry, BuildPrehashedHasher>,
    dirty: bool,
    modified: bool,
}

impl MixNameDatabase {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether the database changed since it was loaded and should be
    /// persisted on exit.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.names.contains_key(file_name)
    }

    /// Register a name, computing the hashes the method asks for (`None`
    /// computes both). Returns false when nothing was missing.
    pub fn add_entry(&mut self, file_name: &str, file_desc: &str, method: Option<HashMethod>) -> bool {
        let entry = self
            .names
            .entry(file_name.to_string())
            .or_insert_with(|| DataEntry {
                file_name: file_name.to_string(),
                file_desc: file_desc.to_string(),
                ..DataEntry::default()
            });
        let mut added = false;
        if method != Some(HashMethod::Crc32) && entry.cnc_hash == 0 {
            entry.cnc_hash = HashMethod::Cnc.hash(file_name);
            added = true;
        }
        if method != Some(HashMethod::Cnc) && entry.crc32_hash == 0 {
            entry.crc32_hash = HashMethod::Crc32.hash(file_name);
            added = true;
        }
        if added {
            self.dirty = true;
            self.modified = true;
        }
        added
    }

    /// Insert a record with precomputed hashes, e.g. from a database
    /// file. Existing names win; the duplicate is dropped.
    pub(crate) fn insert_raw(&mut self, file_name: &str, file_desc: &str, cnc_hash: i32, crc32_hash: i32) {
        if self.contains(file_name) {
            return;
        }
        self.names.insert(
            file_name.to_string(),
            DataEntry {
                file_name: file_name.to_string(),
                file_desc: file_desc.to_string(),
                cnc_hash,
                crc32_hash,
            },
        );
        self.dirty = true;
    }

    /// Look up a hash. `None` probes the C&C map first, then CRC32.
    pub fn get_entry(&mut self, hash: i32, method: Option<HashMethod>) -> Option<&NameEntry> {
        self.refresh();
        match method {
            Some(HashMethod::Cnc) => self.cnc_map.get(&hash),
            Some(HashMethod::Crc32) => self.crc32_map.get(&hash),
            None => self.cnc_map.get(&hash).or_else(|| self.crc32_map.get(&hash)),
        }
    }

    /// Resolved file name, or the 8 digit uppercase hex of the hash.
    pub fn name_or_hash(&mut self, hash: i32, method: Option<HashMethod>) -> String {
        self.get_entry(hash, method)
            .map(|entry| entry.file_name.clone())
            .unwrap_or_else(|| format!("{:0>8X}", hash))
    }

    /// Iterate registered records in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &DataEntry> {
        self.names.values()
    }

    /// Rebuild the reverse maps if anything changed since the last call.
    /// Collisions are resolved here: the later registration loses its
    /// hash.
    pub fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.cnc_map.clear();
        self.crc32_map.clear();
        let mut nulled = false;
        for entry in self.names.values_mut() {
            nulled |= Self::register(
                &mut self.cnc_map,
                &mut entry.cnc_hash,
                &entry.file_name,
                &entry.file_desc,
                "C&C hash",
            );
            nulled |= Self::register(
                &mut self.crc32_map,
                &mut entry.crc32_hash,
                &entry.file_name,
                &entry.file_desc,
                "CRC32",
            );
        }
        if nulled {
            self.modified = true;
        }
        self.dirty = false;
    }

    /// Returns true when a collision nulled the hash.
    fn register(
        map: &mut HashMap<i32, NameEntry, BuildPrehashedHasher>,
        hash: &mut i32,
        file_name: &str,
        file_desc: &str,
        scheme: &str,
    ) -> bool {
        if *hash == 0 {
            return false;
        }
        if let Some(taken) = map.get(hash) {
            log::warn!(
                "Hash collision: {} hashes to the same {} value as {}; name ignored",
                file_name,
                scheme,
                taken.file_name
            );
            *hash = 0;
            return true;
        }
        map.insert(
            *hash,
            NameEntry {
                file_name: file_name.to_string(),
                file_desc: file_desc.to_string(),
            },
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::MixNameDatabase;
    use crate::crc::HashMethod;

    #[test]
    fn add_and_look_up() {
        let mut db = MixNameDatabase::default();
        assert!(db.add_entry("conquer.mix", "main archive", None));
        assert_eq!(db.len(), 1);

        let cnc = HashMethod::Cnc.hash("conquer.mix");
        let entry = db.get_entry(cnc, Some(HashMethod::Cnc)).unwrap();
        assert_eq!(entry.file_name, "conquer.mix");
        assert_eq!(entry.file_desc, "main archive");

        let crc = HashMethod::Crc32.hash("conquer.mix");
        assert!(db.get_entry(crc, Some(HashMethod::Crc32)).is_some());
        // The any-scheme probe finds both.
        assert!(db.get_entry(cnc, None).is_some());
        assert!(db.get_entry(crc, None).is_some());
    }

    #[test]
    fn add_entry_reports_nothing_missing() {
        let mut db = MixNameDatabase::default();
        assert!(db.add_entry("rules.ini", "", None));
        assert!(!db.add_entry("rules.ini", "", None));
        assert!(!db.add_entry("rules.ini", "", Some(HashMethod::Cnc)));
    }

    #[test]
    fn single_scheme_registration() {
        let mut db = MixNameDatabase::default();
        db.add_entry("tanya.voc", "", Some(HashMethod::Cnc));
        let cnc = HashMethod::Cnc.hash("tanya.voc");
        let crc = HashMethod::Crc32.hash("tanya.voc");
        assert!(db.get_entry(cnc, Some(HashMethod::Cnc)).is_some());
        assert!(db.get_entry(crc, Some(HashMethod::Crc32)).is_none());
        // The CRC32 hash can be filled in later.
        assert!(db.add_entry("tanya.voc", "", Some(HashMethod::Crc32)));
        assert!(db.get_entry(crc, Some(HashMethod::Crc32)).is_some());
    }

    #[test]
    fn name_or_hash_falls_back_to_hex() {
        let mut db = MixNameDatabase::default();
        db.add_entry("shok.shp", "", None);
        let id = HashMethod::Cnc.hash("shok.shp");
        assert_eq!(db.name_or_hash(id, Some(HashMethod::Cnc)), "shok.shp");
        assert_eq!(db.name_or_hash(0x0000BEEF, None), "0000BEEF");
        assert_eq!(db.name_or_hash(-1, None), "FFFFFFFF");
    }

    #[test]
    fn collision_nulls_the_second_registration() {
        // Both names produce the C&C hash 0xDACBCFB0; their CRC32 hashes
        // differ.
        let first = "AAAA.MIX";
        let second = "BAAA,MIX";
        let id = HashMethod::Cnc.hash(first);
        assert_eq!(id, HashMethod::Cnc.hash(second));

        let mut db = MixNameDatabase::default();
        db.add_entry(first, "", None);
        db.add_entry(second, "", None);

        let entry = db.get_entry(id, Some(HashMethod::Cnc)).unwrap();
        assert_eq!(entry.file_name, first);

        // The loser keeps its record but its C&C hash is nulled.
        let loser = db.entries().find(|e| e.file_name == second).unwrap();
        assert_eq!(loser.cnc_hash, 0);
        assert_ne!(loser.crc32_hash, 0);
        assert!(db.is_modified());
    }

    #[test]
    fn insert_raw_keeps_the_first_record() {
        let mut db = MixNameDatabase::default();
        db.insert_raw("palace.shp", "desert palace", 0x1111, 0x2222);
        db.insert_raw("palace.shp", "imposter", 0x3333, 0x4444);
        db.refresh();
        assert_eq!(db.len(), 1);
        let entry = db.get_entry(0x1111, Some(HashMethod::Cnc)).unwrap();
        assert_eq!(entry.file_desc, "desert palace");
        assert!(db.get_entry(0x3333, Some(HashMethod::Cnc)).is_none());
        // Loading precomputed records is not a modification.
        assert!(!db.is_modified());
    }
}
