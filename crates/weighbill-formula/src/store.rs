//! Formula store
//!
//! The store maps formula column names to named-reference expressions. It
//! is persisted as a JSON object whose key order is kept on load and save:
//!
//! ```json
//! { "Bill Basic Amt": { "formula": "=[Bill Wt (Qtl)] * [Basic Rate as per Bill]", "excel_formula": "" } }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use weighbill_core::fs::atomic_write;
use weighbill_core::ColumnSchema;

use crate::error::{FormulaError, FormulaResult};
use crate::resolve::{is_auto_increment, resolve};

/// Built-in expressions, in store order
///
/// `Other Crs Amt` does not match the schema's `Other Crs amt`; the
/// definition is kept and reported by the lint.
pub const DEFAULT_FORMULAS: &[(&str, &str)] = &[
    (
        "Kanda Wt without Bardana(Qtl)",
        "=[Kanda Wt with Bardana(Qtl)] - [Bags] * 0.02",
    ),
    ("Bill Basic Amt", "=[Bill Wt (Qtl)] * [Basic Rate as per Bill]"),
    ("Dami Amt", "=[Other Amt]"),
    ("MRN No.", "=ROW()-1"),
    ("Other Crs Amt", "=[Other Amt]"),
    (
        "Total Bill Amt (Rounded Off)",
        "=ROUND([Bill Basic Amt] + [Dami Amt], 0)",
    ),
    ("Cost as per Bill", "=[Total Bill Amt (Rounded Off)]"),
    (
        "Shortage",
        "=[Bill Wt (Qtl)] - [Kanda Wt without Bardana(Qtl)]",
    ),
    ("Shortage Amt", "=[Shortage] * [Basic Rate as per Bill]"),
    ("Rate Diff (per Qtl)", "=[Basic Rate as per Bill] - [Sauda]"),
    ("Rate Diff Amt", "=[Rate Diff (per Qtl)] * [Bill Wt (Qtl)]"),
    ("Fungus Cut", "=[Fungus] * 1"),
    ("Broken Cut", "=[Broken] * 1"),
    ("Moisture Cut", "=[Moist(%)] * 1"),
    (
        "Raw Material Value",
        "=[Total Bill Amt (Rounded Off)] - [Fungus Cut] - [Broken Cut] - [Moisture Cut]",
    ),
];

/// One stored formula
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormulaDefinition {
    /// Named-reference expression, e.g. `=[Bags] * 0.02`
    pub formula: String,
    /// Informational translation for data row 1
    #[serde(default)]
    pub excel_formula: String,
}

impl FormulaDefinition {
    /// Create a definition with an empty translation
    pub fn new<S: Into<String>>(formula: S) -> Self {
        Self {
            formula: formula.into(),
            excel_formula: String::new(),
        }
    }

    /// Whether this is the auto-increment pseudo-formula
    pub fn is_auto_increment(&self) -> bool {
        is_auto_increment(&self.formula)
    }

    /// Whether the expression has any content
    pub fn is_blank(&self) -> bool {
        self.formula.trim().is_empty()
    }
}

/// Ordered set of formula definitions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormulaSet {
    entries: Vec<(String, FormulaDefinition)>,
}

impl FormulaSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in default set
    pub fn defaults() -> Self {
        DEFAULT_FORMULAS
            .iter()
            .map(|(col, expr)| (col.to_string(), FormulaDefinition::new(*expr)))
            .collect()
    }

    /// Load the store at `path`, falling back to the defaults
    ///
    /// A missing file, unreadable file or malformed content all yield
    /// [`FormulaSet::defaults`]; the reason is logged at warn level.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "No formula store at {}, using built-in defaults",
                path.display()
            );
            return Self::defaults();
        }
        match Self::read_file(path) {
            Ok(set) => {
                log::debug!("Loaded {} formulas from {}", set.len(), path.display());
                set
            }
            Err(e) => {
                log::warn!("{}; using built-in defaults", e);
                Self::defaults()
            }
        }
    }

    /// Read the store at `path`, failing on any problem
    pub fn read_file(path: impl AsRef<Path>) -> FormulaResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file)).map_err(|e| FormulaError::InvalidStore {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse a store from a reader
    pub fn read_from<R: Read>(reader: R) -> FormulaResult<Self> {
        let map: Map<String, Value> = serde_json::from_reader(reader)?;
        let mut entries = Vec::with_capacity(map.len());
        for (column, value) in map {
            let definition: FormulaDefinition = serde_json::from_value(value)?;
            entries.push((column, definition));
        }
        Ok(Self { entries })
    }

    /// Write the store as pretty-printed JSON
    pub fn write_to<W: Write>(&self, writer: W) -> FormulaResult<()> {
        let mut map = Map::with_capacity(self.entries.len());
        for (column, definition) in &self.entries {
            map.insert(column.clone(), serde_json::to_value(definition)?);
        }
        serde_json::to_writer_pretty(writer, &Value::Object(map))?;
        Ok(())
    }

    /// Persist the store to `path`, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> FormulaResult<()> {
        let path = path.as_ref();
        atomic_write(path, |file| -> FormulaResult<()> {
            let mut writer = BufWriter::new(file);
            self.write_to(&mut writer)?;
            writer.flush()?;
            Ok(())
        })?;
        log::info!("Saved {} formulas to {}", self.len(), path.display());
        Ok(())
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definition for a column (exact name match)
    pub fn get(&self, column: &str) -> Option<&FormulaDefinition> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, d)| d)
    }

    /// Non-blank expression for a column
    pub fn expression(&self, column: &str) -> Option<&str> {
        self.get(column)
            .map(|d| d.formula.as_str())
            .filter(|f| !f.trim().is_empty())
    }

    /// Insert or replace a column's expression
    ///
    /// Replacing keeps the entry's position; a new column goes at the end.
    /// The translation is cleared either way.
    pub fn set<C: Into<String>, F: Into<String>>(&mut self, column: C, formula: F) {
        let column = column.into();
        let definition = FormulaDefinition::new(formula);
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = definition,
            None => self.entries.push((column, definition)),
        }
    }

    /// Remove a column's definition
    pub fn remove(&mut self, column: &str) -> Option<FormulaDefinition> {
        let pos = self.entries.iter().position(|(c, _)| c == column)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate over `(column, definition)` in store order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormulaDefinition)> {
        self.entries.iter().map(|(c, d)| (c.as_str(), d))
    }

    /// Column names in store order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Fill every `excel_formula` with the translation for data row 1
    pub fn refresh_translations(&mut self, schema: &ColumnSchema) {
        for (_, definition) in &mut self.entries {
            definition.excel_formula = resolve(&definition.formula, schema, 1).into_formula();
        }
    }
}

impl FromIterator<(String, FormulaDefinition)> for FormulaSet {
    fn from_iter<I: IntoIterator<Item = (String, FormulaDefinition)>>(iter: I) -> Self {
        let mut set = FormulaSet::new();
        for (column, definition) in iter {
            match set.entries.iter_mut().find(|(c, _)| *c == column) {
                Some((_, existing)) => *existing = definition,
                None => set.entries.push((column, definition)),
            }
        }
        set
    }
}
