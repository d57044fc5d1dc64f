//! INI structures and manipulation.

use indexmap::IndexMap;

/// An INI file organizes data into named sections of key-value entries.
/// Section order is maintained; names are unique.
#[derive(Debug, Default, PartialEq)]
pub struct IniFile {
    sections: IndexMap<String, IniSection>,
}

impl IniFile {
    /// Iterate sections in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IniSection)> {
        self.sections.iter()
    }

    /// Sort all sections by name.
    pub fn sort(&mut self) {
        self.sections.sort_keys();
    }

    /// Look up a section by name.
    pub fn get_section(&self, name: impl AsRef<str>) -> Option<&IniSection> {
        self.sections.get(name.as_ref())
    }

    /// Look up an entry value across section and key.
    pub fn get_str(&self, section: impl AsRef<str>, key: impl AsRef<str>) -> Option<&str> {
        self.get_section(section).and_then(|s| s.get_str(key))
    }

    /// Insert a section. A section with the same name is replaced and
    /// returned.
    pub fn add_section(&mut self, section: IniSection) -> Option<IniSection> {
        self.sections.insert(section.get_name().clone(), section)
    }

    /// Insert an entry, creating the section if needed. An entry with the
    /// same key is replaced and returned.
    pub fn add_to_section(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<IniEntry> {
        let name = section.into();
        if let Some(section) = self.sections.get_mut(&name) {
            section.create_entry(key, value)
        } else {
            let mut section = IniSection::new(name);
            section.create_entry(key, value);
            self.add_section(section);
            None
        }
    }

    /// Remove a section by name, returning it if present.
    pub fn remove_section(&mut self, name: impl AsRef<str>) -> Option<IniSection> {
        self.sections.shift_remove(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A named collection of key-value entries.
#[derive(Debug, Default, PartialEq)]
pub struct IniSection {
    name: String,
    entries: IndexMap<String, IniEntry>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn get_name(&self) -> &String {
        &self.name
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IniEntry)> {
        self.entries.iter()
    }

    /// Look up an entry by key.
    pub fn get_entry(&self, key: impl AsRef<str>) -> Option<&IniEntry> {
        self.entries.get(key.as_ref())
    }

    /// Look up an entry value by key.
    pub fn get_str(&self, key: impl AsRef<str>) -> Option<&str> {
        self.get_entry(key).map(|e| e.value.as_str())
    }

    /// Insert an entry. An entry with the same key is replaced and
    /// returned.
    pub fn add_entry(&mut self, entry: IniEntry) -> Option<IniEntry> {
        self.entries.insert(entry.key.clone(), entry)
    }

    /// Create an entry in place. An entry with the same key is replaced
    /// and returned.
    pub fn create_entry(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<IniEntry> {
        let key: String = key.into();
        self.entries.insert(
            key.clone(),
            IniEntry {
                key,
                value: value.into(),
            },
        )
    }
}

/// A key-value pair belonging to a section. Values are kept verbatim as
/// strings.
#[derive(Debug, Default, PartialEq)]
pub struct IniEntry {
    key: String,
    pub value: String,
}

impl IniEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IniFile, IniSection};

    #[test]
    fn add_and_get() {
        let mut ini = IniFile::default();
        ini.add_to_section("house", "Color", "red");
        ini.add_to_section("house", "Side", "soviet");
        assert_eq!(ini.get_str("house", "Color"), Some("red"));
        assert_eq!(ini.get_str("house", "Side"), Some("soviet"));
        assert_eq!(ini.get_str("house", "Name"), None);
        assert_eq!(ini.get_str("barracks", "Color"), None);
        assert_eq!(ini.len(), 1);
    }

    #[test]
    fn replacing_an_entry_returns_the_old_one() {
        let mut ini = IniFile::default();
        assert!(ini.add_to_section("a", "k", "1").is_none());
        let old = ini.add_to_section("a", "k", "2");
        assert!(old.is_some());
        assert_eq!(old.unwrap().value, "1");
        assert_eq!(ini.get_str("a", "k"), Some("2"));
    }

    #[test]
    fn sections_keep_insertion_order_until_sorted() {
        let mut ini = IniFile::default();
        ini.add_section(IniSection::new("b"));
        ini.add_section(IniSection::new("a"));
        let names: Vec<&String> = ini.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["b", "a"]);
        ini.sort();
        let names: Vec<&String> = ini.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn remove_section() {
        let mut ini = IniFile::default();
        ini.add_to_section("a", "k", "1");
        assert!(ini.remove_section("a").is_some());
        assert!(ini.is_empty());
        assert!(ini.remove_section("a").is_none());
    }
}
