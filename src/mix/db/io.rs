//! Name database persistence: the INI format, XCC binary import and the
//! built-in seed names.

use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

use crate::crc::HashMethod;
use crate::ini::{
    io::{IniReader, IniWriter},
    IniFile, IniSection,
};
use crate::mix::db::MixNameDatabase;
use crate::utils::{hex2int, program_dir, user_config_dir};

/// File name of the persistent database.
pub const DATABASE_FILENAME: &str = "filenames.db";

/// Hash scheme of each of the four XCC database tranches: two game eras
/// with the C&C hash, then two with CRC32.
const TRANCH_METHODS: [HashMethod; 4] = [
    HashMethod::Cnc,
    HashMethod::Cnc,
    HashMethod::Crc32,
    HashMethod::Crc32,
];

/// Seed names for a fresh database, covering the well known stock
/// archives and configuration files the games ship with.
const INTERNAL_NAMES: &[&str] = &[
    "aud.mix",
    "cclocal.mix",
    "conquer.mix",
    "desert.mix",
    "expand.mix",
    "expand2.mix",
    "general.mix",
    "hires.mix",
    "hires1.mix",
    "interior.mix",
    "local.mix",
    "lores.mix",
    "lores1.mix",
    "main.mix",
    "movies1.mix",
    "movies2.mix",
    "multi.mix",
    "redalert.mix",
    "russian.mix",
    "scores.mix",
    "snow.mix",
    "sounds.mix",
    "speech.mix",
    "tempicnh.mix",
    "temperat.mix",
    "theme.mix",
    "transit.mix",
    "winter.mix",
    "local mix database.dat",
    "ai.ini",
    "art.ini",
    "mission.ini",
    "redalert.ini",
    "rules.ini",
    "sound.ini",
    "theme.ini",
    "tutorial.ini",
];

/// The error type for name database I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An [`std::io::Error`].
    #[error("{0}")]
    IO(#[from] std::io::Error),
    /// An error from the INI layer.
    #[error("{0}")]
    IniIO(#[from] crate::ini::io::Error),
    /// A stored hash value is not valid hex.
    #[error("{0}")]
    ParseIntError(#[from] crate::utils::ParseIntError),
    /// An XCC database string is not valid UTF-8.
    #[error("{0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    /// An XCC database string never terminated.
    #[error("Expected a NUL terminated string in the XCC database")]
    NoNullTermination,
    /// No usable directory to keep the database in.
    #[error("Neither a user configuration directory nor a program directory is available")]
    NoDatabaseLocation,
}

type Result<T> = std::result::Result<T, Error>;

/// Reads name databases persisted as INI files.
pub struct NameDbReader {}

impl NameDbReader {
    /// Merge an INI database into `db`. One section per filename; when a
    /// filename appears twice, the first section wins.
    pub fn read_file(db: &mut MixNameDatabase, reader: impl BufRead) -> Result<()> {
        let ini = IniReader::read_file(reader)?;
        for (name, section) in ini.iter() {
            let desc = section.get_str("Comment").unwrap_or_default();
            let cnc = section.get_str("CnCHash").map(hex2int).transpose()?;
            let crc32 = section.get_str("CRC32Hash").map(hex2int).transpose()?;
            db.insert_raw(name, desc, cnc.unwrap_or_default(), crc32.unwrap_or_default());
        }
        db.refresh();
        Ok(())
    }
}

/// Writes name databases as INI files.
pub struct NameDbWriter {}

impl NameDbWriter {
    /// Emit every record in filename-lexical order, omitting zero hashes
    /// and empty comments.
    pub fn write_file(db: &mut MixNameDatabase, writer: &mut impl Write) -> Result<()> {
        db.refresh();
        let mut ini = IniFile::default();
        for entry in db.entries() {
            let mut section = IniSection::new(&entry.file_name);
            if !entry.file_desc.is_empty() {
                section.create_entry("Comment", &entry.file_desc);
            }
            if entry.cnc_hash != 0 {
                section.create_entry("CnCHash", format!("{:08X}", entry.cnc_hash));
            }
            if entry.crc32_hash != 0 {
                section.create_entry("CRC32Hash", format!("{:08X}", entry.crc32_hash));
            }
            ini.add_section(section);
        }
        ini.sort();
        IniWriter::write_file(&ini, writer)?;
        Ok(())
    }
}

/// Imports the binary XCC database format: four tranches, each a `u32`
/// count followed by that many NUL terminated (name, description) pairs.
pub struct XccDbReader {}

impl XccDbReader {
    pub fn read_file(db: &mut MixNameDatabase, reader: &mut impl BufRead) -> Result<()> {
        for method in TRANCH_METHODS {
            if !Self::read_tranch(db, reader, method)? {
                break;
            }
        }
        db.refresh();
        Ok(())
    }

    /// Returns false when the source ended before this tranch.
    fn read_tranch(
        db: &mut MixNameDatabase,
        reader: &mut impl BufRead,
        method: HashMethod,
    ) -> Result<bool> {
        let mut buf = [0u8; 4];
        if let Err(err) = reader.read_exact(&mut buf) {
            return match err.kind() {
                std::io::ErrorKind::UnexpectedEof => Ok(false),
                _ => Err(err.into()),
            };
        }
        let count = u32::from_le_bytes(buf);
        for _ in 0..count {
            let name = Self::read_string(reader)?;
            let desc = Self::read_string(reader)?;
            db.add_entry(&name, &desc, Some(method));
        }
        Ok(true)
    }

    fn read_string(reader: &mut impl BufRead) -> Result<String> {
        let mut raw = Vec::new();
        reader.read_until(0, &mut raw)?;
        if raw.pop() != Some(0) {
            return Err(Error::NoNullTermination);
        }
        Ok(String::from_utf8(raw)?)
    }
}

/// Seed a database with the built-in names.
pub fn read_internal(db: &mut MixNameDatabase) {
    for name in INTERNAL_NAMES {
        db.add_entry(name, "", None);
    }
    db.refresh();
}

/// Load the persistent filename database.
///
/// The user configuration copy is preferred, then one next to the
/// executable; with neither present a fresh database is seeded from the
/// built-in names. The returned path is where the database should be
/// saved on exit.
pub fn open_default_database() -> Result<(MixNameDatabase, PathBuf)> {
    let user = user_config_dir().map(|dir| dir.join(DATABASE_FILENAME));
    let prog = program_dir().map(|dir| dir.join(DATABASE_FILENAME));

    let mut db = MixNameDatabase::default();
    for path in [&user, &prog].into_iter().flatten() {
        if let Ok(file) = File::open(path) {
            match NameDbReader::read_file(&mut db, BufReader::new(file)) {
                Ok(()) => return Ok((db, path.clone())),
                Err(err) => {
                    log::warn!("Failed to read {}: {}", path.display(), err);
                    db = MixNameDatabase::default();
                }
            }
        }
    }

    log::info!("No file name database found, seeding one from the built-in names.");
    read_internal(&mut db);
    let path = user.or(prog).ok_or(Error::NoDatabaseLocation)?;
    Ok((db, path))
}

/// Persist the database, creating the parent directory if needed.
pub fn save_database(db: &mut MixNameDatabase, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = File::create(path)?;
    NameDbWriter::write_file(db, &mut writer)?;
    Ok(())
}
