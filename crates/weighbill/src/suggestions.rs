//! Autocomplete suggestion lists
//!
//! Each suggestion-enabled field keeps a sorted, deduplicated list of
//! values it has seen, stored as a JSON array in
//! `<dir>/<key>_suggestions.json`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use weighbill_core::fs::atomic_write;
use weighbill_core::ColumnSchema;

use crate::error::Result;

/// New suggestion lists waiting to be written by [`SuggestionStore::commit`]
#[derive(Debug, Clone, Default)]
pub struct SuggestionUpdate {
    lists: Vec<(String, Vec<String>)>,
    added: usize,
}

impl SuggestionUpdate {
    /// True when no list changes
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Number of values staged so far
    pub fn added(&self) -> usize {
        self.added
    }
}

/// Suggestion lists keyed by field
#[derive(Debug, Clone)]
pub struct SuggestionStore {
    dir: PathBuf,
    lists: AHashMap<String, Vec<String>>,
}

impl SuggestionStore {
    /// Open the store in `dir`, loading the list of every suggestion
    /// column in `schema`
    ///
    /// Missing files are empty lists. Unreadable files, or files that are
    /// not a JSON array of strings, are logged and treated as empty.
    pub fn open<P: Into<PathBuf>>(dir: P, schema: &ColumnSchema) -> Self {
        let mut store = Self {
            dir: dir.into(),
            lists: AHashMap::new(),
        };
        for column in schema.suggestion_columns() {
            if let Some(key) = &column.suggestion_key {
                let list = store.read_list(key);
                store.lists.insert(key.clone(), list);
            }
        }
        store
    }

    /// Directory holding the lists
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the list for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}_suggestions.json", key))
    }

    /// Stored values for `key`, in stored order
    pub fn suggestions(&self, key: &str) -> &[String] {
        self.lists.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record one value; returns whether the list changed
    ///
    /// The value is trimmed. Blank values and values already present are
    /// ignored. A change rewrites the file.
    pub fn record_value(&mut self, key: &str, value: &str) -> Result<bool> {
        Ok(self.merge(key, std::iter::once(value))? > 0)
    }

    /// Add every new value to the list for `key`; returns how many were added
    pub fn merge<I, S>(&mut self, key: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut update = SuggestionUpdate::default();
        self.stage(&mut update, key, values);
        self.commit(update)
    }

    /// Add the new values for `key` to `update` without touching the store
    ///
    /// Staging the same key twice builds on the earlier staged list.
    pub fn stage<I, S>(&self, update: &mut SuggestionUpdate, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let position = update.lists.iter().position(|(k, _)| k == key);
        let mut list = match position {
            Some(i) => update.lists[i].1.clone(),
            None => self.suggestions(key).to_vec(),
        };
        let mut added = 0;
        for value in values {
            let value = value.as_ref().trim();
            if value.is_empty() || list.iter().any(|v| v == value) {
                continue;
            }
            list.push(value.to_string());
            added += 1;
        }
        if added == 0 {
            return;
        }

        list.sort();
        list.dedup();
        update.added += added;
        match position {
            Some(i) => update.lists[i].1 = list,
            None => update.lists.push((key.to_string(), list)),
        }
    }

    /// Write every staged list, then keep them; returns how many values
    /// were added
    ///
    /// When a write fails, lists already written are put back on disk and
    /// the store is left as it was.
    pub fn commit(&mut self, update: SuggestionUpdate) -> Result<usize> {
        for (done, (key, list)) in update.lists.iter().enumerate() {
            if let Err(e) = self.write_list(key, list) {
                for (key, _) in &update.lists[..done] {
                    if let Err(restore) = self.write_list(key, self.suggestions(key)) {
                        log::warn!("Cannot restore suggestions for {}: {}", key, restore);
                    }
                }
                return Err(e);
            }
        }

        for (key, list) in update.lists {
            log::debug!("Suggestions for {} now hold {} values", key, list.len());
            self.lists.insert(key, list);
        }
        Ok(update.added)
    }

    /// Values for `key` starting with `prefix`, ignoring case
    ///
    /// A value equal to the prefix is left out, since there is nothing to
    /// complete.
    pub fn matches(&self, key: &str, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.suggestions(key)
            .iter()
            .filter(|v| {
                let lower = v.to_lowercase();
                lower.starts_with(&prefix) && lower != prefix
            })
            .map(String::as_str)
            .collect()
    }

    fn read_list(&self, key: &str) -> Vec<String> {
        let path = self.path_for(key);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!("Cannot read suggestions {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_reader::<_, Vec<String>>(BufReader::new(file)) {
            Ok(list) => list,
            Err(e) => {
                log::warn!("Ignoring malformed suggestions {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    fn write_list(&self, key: &str, list: &[String]) -> Result<()> {
        atomic_write(self.path_for(key), |file| -> Result<()> {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, list)?;
            writer.flush()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> SuggestionStore {
        SuggestionStore::open(dir.path(), ColumnSchema::bill())
    }

    #[test]
    fn test_record_sorts_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);

        assert!(store.record_value("city", " Karnal ").unwrap());
        assert!(store.record_value("city", "Ambala").unwrap());
        assert!(!store.record_value("city", "Karnal").unwrap());
        assert!(!store.record_value("city", "   ").unwrap());
        assert_eq!(store.suggestions("city"), ["Ambala", "Karnal"]);

        let text = fs::read_to_string(dir.path().join("city_suggestions.json")).unwrap();
        let on_disk: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(on_disk, vec!["Ambala", "Karnal"]);

        let reopened = open(&dir);
        assert_eq!(reopened.suggestions("city"), ["Ambala", "Karnal"]);
    }

    #[test]
    fn test_matches() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        store
            .merge("agent", ["Ram Traders", "ramesh", "Ram", "Shyam"])
            .unwrap();

        assert_eq!(store.matches("agent", "ram"), vec!["Ram Traders", "ramesh"]);
        assert_eq!(store.matches("agent", "SH"), vec!["Shyam"]);
        assert!(store.matches("agent", "x").is_empty());
        assert!(store.matches("unknown", "r").is_empty());
    }

    #[test]
    fn test_malformed_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("agent_suggestions.json"), "{\"not\": \"a list\"}").unwrap();
        fs::write(dir.path().join("city_suggestions.json"), "[\"Panipat\"").unwrap();

        let store = open(&dir);
        assert!(store.suggestions("agent").is_empty());
        assert!(store.suggestions("city").is_empty());
    }

    #[test]
    fn test_merge_counts_new_values() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        assert_eq!(store.merge("party_name", ["B", "A", "B", ""]).unwrap(), 2);
        assert_eq!(store.merge("party_name", ["A"]).unwrap(), 0);
        assert_eq!(store.suggestions("party_name"), ["A", "B"]);
    }

    #[test]
    fn test_staged_values_wait_for_commit() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        let mut update = SuggestionUpdate::default();
        store.stage(&mut update, "city", ["Karnal"]);
        store.stage(&mut update, "city", ["Ambala", "Karnal"]);
        assert_eq!(update.added(), 2);
        assert!(store.suggestions("city").is_empty());
        assert!(!dir.path().join("city_suggestions.json").exists());

        assert_eq!(store.commit(update).unwrap(), 2);
        assert_eq!(store.suggestions("city"), ["Ambala", "Karnal"]);
        assert_eq!(open(&dir).suggestions("city"), ["Ambala", "Karnal"]);
    }

    #[test]
    fn test_failed_commit_keeps_old_lists() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        store.record_value("city", "Panipat").unwrap();
        fs::create_dir(dir.path().join("agent_suggestions.json")).unwrap();

        let mut update = SuggestionUpdate::default();
        store.stage(&mut update, "city", ["Karnal"]);
        store.stage(&mut update, "agent", ["Ram Traders"]);
        assert!(store.commit(update).is_err());

        assert_eq!(store.suggestions("city"), ["Panipat"]);
        assert!(store.suggestions("agent").is_empty());
        assert_eq!(open(&dir).suggestions("city"), ["Panipat"]);
    }
}
