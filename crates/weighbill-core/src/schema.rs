//! Column schema
//!
//! The schema is the ordered list of bill columns. Its order is the column
//! order of the exported sheet, so a column's position decides its letter in
//! every translated formula.

use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::cell::column_to_letters;
use crate::error::{Error, Result};

/// Category of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Entered once and kept across rows until changed (rates, quality figures)
    GlobalInput,
    /// Entered for every row and cleared after the row is added
    RowInput,
    /// Derived from other columns through a formula
    Formula,
}

impl ColumnKind {
    /// Whether cells of this kind are typed in by the user
    pub fn is_input(&self) -> bool {
        !matches!(self, ColumnKind::Formula)
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::GlobalInput => "global",
            ColumnKind::RowInput => "row",
            ColumnKind::Formula => "formula",
        }
    }
}

/// A single schema column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name, also the header text
    pub name: String,
    /// Category
    pub kind: ColumnKind,
    /// Key of the suggestion list backing this column, if it has one
    pub suggestion_key: Option<String>,
}

impl Column {
    /// Create a global-input column
    pub fn global<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnKind::GlobalInput)
    }

    /// Create a row-input column
    pub fn row<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnKind::RowInput)
    }

    /// Create a formula column
    pub fn formula<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnKind::Formula)
    }

    fn new<S: Into<String>>(name: S, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            suggestion_key: None,
        }
    }

    /// Back this column with a suggestion list
    pub fn with_suggestions<S: Into<String>>(mut self, key: S) -> Self {
        self.suggestion_key = Some(key.into());
        self
    }

    /// Whether the column offers autocomplete suggestions
    pub fn supports_suggestions(&self) -> bool {
        self.suggestion_key.is_some()
    }
}

/// Ordered set of bill columns
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    columns: Vec<Column>,
    index: AHashMap<String, usize>,
}

static BILL_SCHEMA: Lazy<ColumnSchema> = Lazy::new(|| {
    ColumnSchema::from_unique(vec![
        Column::row("Arrival Lot date"),
        Column::formula("MRN No."),
        Column::row("Bill No."),
        Column::row("Bill Date"),
        Column::row("Agent").with_suggestions("agent"),
        Column::row("Party Name").with_suggestions("party_name"),
        Column::row("City").with_suggestions("city"),
        Column::row("Mkt Committee").with_suggestions("mkt_committee"),
        Column::row("Vehicle No."),
        Column::row("Bags"),
        Column::row("Bill Wt (Qtl)"),
        Column::row("Kanda Wt with Bardana(Qtl)"),
        Column::formula("Kanda Wt without Bardana(Qtl)"),
        Column::global("Basic Rate as per Bill"),
        Column::formula("Bill Basic Amt"),
        Column::formula("Dami Amt"),
        Column::row("Other Amt"),
        Column::formula("Other Crs amt"),
        Column::formula("Total Bill Amt (Rounded Off)"),
        Column::formula("Cost as per Bill"),
        Column::global("Sauda"),
        Column::global("Moist(%)"),
        Column::global("Fungus"),
        Column::global("Broken"),
        Column::formula("Shortage"),
        Column::formula("Shortage Amt"),
        Column::formula("Rate Diff (per Qtl)"),
        Column::formula("Rate Diff Amt"),
        Column::formula("Fungus Cut"),
        Column::formula("Broken Cut"),
        Column::formula("Moisture Cut"),
        Column::formula("Raw Material Value"),
    ])
});

impl ColumnSchema {
    /// Build a schema, rejecting duplicate names and suggestion lists on
    /// columns that are not row inputs
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = AHashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if seen.insert(column.name.clone(), i).is_some() {
                return Err(Error::DuplicateColumn(column.name.clone()));
            }
            if column.supports_suggestions() && column.kind != ColumnKind::RowInput {
                return Err(Error::SuggestionsNotAllowed(column.name.clone()));
            }
        }
        Ok(Self {
            columns,
            index: seen,
        })
    }

    /// Build from a list already known to be valid
    fn from_unique(columns: Vec<Column>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { columns, index }
    }

    /// The built-in purchase-bill schema
    pub fn bill() -> &'static ColumnSchema {
        &BILL_SCHEMA
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column at a 0-based position
    pub fn get(&self, position: usize) -> Option<&Column> {
        self.columns.get(position)
    }

    /// All column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// 0-based position of a column (exact, case-sensitive match)
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Category of a column
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|c| c.kind)
    }

    /// Check whether a column exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Sheet column letter of a column ("A" for the first)
    pub fn letter_of(&self, name: &str) -> Option<String> {
        self.position(name).map(|i| column_to_letters(i as u32))
    }

    /// Columns of one category, with their positions, in schema order
    pub fn of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.kind == kind)
    }

    /// Columns backed by a suggestion list
    pub fn suggestion_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.supports_suggestions())
    }
}
