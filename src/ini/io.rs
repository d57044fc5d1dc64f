//! INI reading and writing.

use std::io::{BufRead, Write};

use crate::ini::{IniFile, IniSection};

/// The error type for INI serialization and deserialization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An [`std::io::Error`].
    #[error("{0}")]
    IO(#[from] std::io::Error),
    /// A section is missing its closing bracket.
    #[error("Unclosed section name at line {0}")]
    UnclosedSectionName(usize),
    /// An entry has a key but no value.
    #[error("Missing entry value at line {0}")]
    MissingEntryValue(usize),
    /// An entry has a value but no key.
    #[error("Missing entry key at line {0}")]
    MissingEntryKey(usize),
    /// An entry is just the `=` character.
    #[error("Missing entry key and value at line {0}")]
    MissingEntryKeyAndValue(usize),
    /// An entry appeared before any section header.
    #[error("Entry with no section at line {0}")]
    EntryWithNoSection(usize),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq)]
enum ParsedLine {
    Section(String),
    Entry(String, String),
    Empty,
}

/// Provides static methods for reading INI files.
#[derive(Debug, Default)]
pub struct IniReader {}

impl IniReader {
    /// Read and parse an INI file from input.
    pub fn read_file(reader: impl BufRead) -> Result<IniFile> {
        let mut ini = IniFile::default();
        let mut current: Option<IniSection> = None;

        for (row, line) in reader.lines().enumerate() {
            match Self::parse_line(line?, row)? {
                ParsedLine::Section(name) => {
                    if let Some(section) = current.take() {
                        ini.add_section(section);
                    }
                    current = Some(IniSection::new(name));
                }
                ParsedLine::Entry(key, value) => match current.as_mut() {
                    Some(section) => {
                        section.create_entry(key, value);
                    }
                    None => return Err(Error::EntryWithNoSection(row)),
                },
                ParsedLine::Empty => (),
            }
        }

        if let Some(section) = current {
            ini.add_section(section);
        }
        Ok(ini)
    }

    /// Classify one line as a section header, a key-value entry or noise.
    fn parse_line(line: String, row: usize) -> Result<ParsedLine> {
        let line = line.split(';').next().unwrap_or_else(|| unreachable!());

        if line.starts_with('[') {
            return line
                .find(']')
                .map(|end| ParsedLine::Section(line[1..end].to_string()))
                .ok_or(Error::UnclosedSectionName(row));
        }
        let mut halves = line.splitn(2, '=');
        match (halves.next(), halves.next()) {
            (Some(""), Some("")) => Err(Error::MissingEntryKeyAndValue(row)),
            (Some(_), Some("")) => Err(Error::MissingEntryValue(row)),
            (Some(""), Some(_)) => Err(Error::MissingEntryKey(row)),
            (Some(key), Some(value)) => {
                Ok(ParsedLine::Entry(key.trim().into(), value.trim().into()))
            }
            (Some(_), None) => Ok(ParsedLine::Empty),
            _ => unreachable!(),
        }
    }
}

/// Provides static methods for writing INI files.
pub struct IniWriter {}

impl IniWriter {
    /// Write an INI file to output.
    pub fn write_file(ini: &IniFile, writer: &mut impl Write) -> Result<()> {
        for (name, section) in ini.iter() {
            writeln!(writer, "[{name}]")?;
            for (key, entry) in section.iter() {
                writeln!(writer, "{}={}", key, entry.value)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}
