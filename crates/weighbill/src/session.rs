//! The entry session
//!
//! [`EntrySession`] owns the entered rows, the last global values, the
//! formula store and the suggestion lists. Every mutating action persists
//! the rows and globals to `session.json`, so a front end that runs one
//! action per process sees the same table each time.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use weighbill_core::fs::atomic_write;
use weighbill_core::{
    validate, ColumnKind, ColumnSchema, MaterializedRow, RowCell, ValidationReport,
};
use weighbill_formula::{lint, FormulaIssue, FormulaSet};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{default_destination, export, ExportOptions, ExportReport};
use crate::import::{read_workbook, rows_from_sheet, ImportSummary};
use crate::materialize::{materialize, FieldValues};
use crate::suggestions::{SuggestionStore, SuggestionUpdate};

/// What `session.json` holds
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionState {
    #[serde(default)]
    globals: FieldValues,
    #[serde(default)]
    rows: Vec<MaterializedRow>,
}

/// One user's entry table and everything it depends on
#[derive(Debug)]
pub struct EntrySession {
    config: Config,
    schema: &'static ColumnSchema,
    formulas: FormulaSet,
    suggestions: SuggestionStore,
    globals: FieldValues,
    rows: Vec<MaterializedRow>,
}

impl EntrySession {
    /// Open the session stored under `config`'s home
    ///
    /// The formula store falls back to its defaults; a missing session file
    /// starts an empty table. A session file that cannot be parsed is an
    /// error, since saving over it would lose the rows.
    pub fn open(config: Config) -> Result<Self> {
        let schema = ColumnSchema::bill();
        let formulas = FormulaSet::load(config.formulas_path());
        let suggestions = SuggestionStore::open(config.suggestions_dir(), schema);
        let state = load_state(&config.session_path(), schema)?;

        log::debug!(
            "Opened session at {} with {} rows",
            config.home().display(),
            state.rows.len()
        );
        Ok(Self {
            config,
            schema,
            formulas,
            suggestions,
            globals: state.globals,
            rows: state.rows,
        })
    }

    /// The session's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The column schema
    pub fn schema(&self) -> &'static ColumnSchema {
        self.schema
    }

    /// The formula store in use
    pub fn formulas(&self) -> &FormulaSet {
        &self.formulas
    }

    /// The suggestion lists
    pub fn suggestions(&self) -> &SuggestionStore {
        &self.suggestions
    }

    /// Global values used as defaults for the next row
    pub fn globals(&self) -> &FieldValues {
        &self.globals
    }

    /// Entered rows, in order
    pub fn rows(&self) -> &[MaterializedRow] {
        &self.rows
    }

    /// Append a row built from `globals` and `row_inputs`
    ///
    /// Globals given here are merged over the remembered ones and become
    /// the defaults for later rows. Suggestion-enabled values are recorded.
    pub fn add_row(&mut self, globals: &FieldValues, row_inputs: &FieldValues) -> Result<usize> {
        self.check_fields(globals, ColumnKind::GlobalInput)?;
        self.check_fields(row_inputs, ColumnKind::RowInput)?;

        let mut merged = self.globals.clone();
        for (name, value) in globals {
            merged.insert(name.clone(), value.trim().to_string());
        }

        let row = materialize(
            self.schema,
            &merged,
            row_inputs,
            &self.formulas,
            self.rows.len(),
        );
        let update = self.stage_suggestions(&row);

        let mut rows = self.rows.clone();
        rows.push(row);
        self.persist_with(&merged, &rows, update)?;
        self.globals = merged;
        self.rows = rows;
        log::debug!("Added row {}", self.rows.len());
        Ok(self.rows.len())
    }

    /// Overwrite input cells of the 1-based row `row`
    ///
    /// Every name is checked before anything changes. Formula columns are
    /// rejected with [`Error::NotEditable`].
    pub fn edit_row(&mut self, row: usize, updates: &FieldValues) -> Result<()> {
        let index = self.row_index(row)?;
        for name in updates.keys() {
            match self.schema.kind_of(name) {
                None => return Err(Error::UnknownColumn(name.clone())),
                Some(ColumnKind::Formula) => return Err(Error::NotEditable(name.clone())),
                Some(_) => {}
            }
        }

        let mut edited = self.rows[index].clone();
        for (name, value) in updates {
            if let Some(position) = self.schema.position(name) {
                edited.set(position, RowCell::Literal(value.trim().to_string()))?;
            }
        }
        self.record_suggestions(&edited)?;

        let mut rows = self.rows.clone();
        rows[index] = edited;
        self.persist(&self.globals, &rows)?;
        self.rows = rows;
        Ok(())
    }

    /// Remove the given 1-based rows; returns how many were removed
    ///
    /// Nothing is removed if any number is out of range.
    pub fn delete_rows(&mut self, rows: &[usize]) -> Result<usize> {
        let mut indices = rows
            .iter()
            .map(|&row| self.row_index(row))
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable();
        indices.dedup();

        let mut remaining = self.rows.clone();
        for &index in indices.iter().rev() {
            remaining.remove(index);
        }
        self.persist(&self.globals, &remaining)?;
        self.rows = remaining;
        log::debug!("Deleted {} rows", indices.len());
        Ok(indices.len())
    }

    /// Remove every row; returns how many there were
    pub fn clear(&mut self) -> Result<usize> {
        let count = self.rows.len();
        self.persist(&self.globals, &[])?;
        self.rows.clear();
        Ok(count)
    }

    /// Validate every row under the configured policy
    pub fn check_entries(&self) -> ValidationReport {
        validate(&self.rows, self.schema, &self.config.validation_rules()).into()
    }

    /// Export the rows, then clear them
    ///
    /// `destination` defaults to a timestamped file in the export
    /// directory. If the export fails the rows are kept.
    pub fn submit(&mut self, destination: Option<&Path>) -> Result<ExportReport> {
        if self.rows.is_empty() {
            return Err(Error::NoRows);
        }
        let destination: PathBuf = match destination {
            Some(path) => path.to_path_buf(),
            None => default_destination(&self.config.export_dir(), Local::now()),
        };
        let options = ExportOptions {
            unresolved: self.config.unresolved,
        };
        let report = export(
            self.schema,
            &self.rows,
            &self.formulas,
            &destination,
            &options,
        )?;

        self.persist(&self.globals, &[])?;
        self.rows.clear();
        Ok(report)
    }

    /// Like [`EntrySession::submit`], but refuses when validation fails
    pub fn submit_validated(&mut self, destination: Option<&Path>) -> Result<ExportReport> {
        let report = self.check_entries();
        if !report.is_valid() {
            return Err(Error::Validation(report));
        }
        self.submit(destination)
    }

    /// Replace and persist the formula store
    ///
    /// Each definition's translation is refreshed before saving. The lint
    /// findings are returned; they never block the save.
    pub fn edit_formulas(&mut self, mut definitions: FormulaSet) -> Result<Vec<FormulaIssue>> {
        definitions.refresh_translations(self.schema);
        definitions.save(self.config.formulas_path())?;
        let issues = lint(&definitions, self.schema);
        for issue in &issues {
            log::warn!("{}", issue);
        }
        self.formulas = definitions;
        Ok(issues)
    }

    /// Set one column's expression and persist the store
    pub fn set_formula(&mut self, column: &str, expression: &str) -> Result<Vec<FormulaIssue>> {
        let mut definitions = self.formulas.clone();
        definitions.set(column, expression);
        self.edit_formulas(definitions)
    }

    /// Restore and persist the built-in formulas
    pub fn reset_formulas(&mut self) -> Result<Vec<FormulaIssue>> {
        self.edit_formulas(FormulaSet::defaults())
    }

    /// Lint the formula store in use
    pub fn lint_formulas(&self) -> Vec<FormulaIssue> {
        lint(&self.formulas, self.schema)
    }

    /// The named-reference expression behind a formula cell
    pub fn formula_for(&self, row: usize, column: &str) -> Result<&str> {
        let index = self.row_index(row)?;
        let position = self
            .schema
            .position(column)
            .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        match self.rows[index].get(position) {
            Some(RowCell::Pending) | Some(RowCell::Computed(_)) => self
                .formulas
                .expression(column)
                .ok_or_else(|| Error::NoFormula(column.to_string())),
            _ => Err(Error::NotFormulaCell {
                row,
                column: column.to_string(),
            }),
        }
    }

    /// Replace the rows with the contents of a workbook
    ///
    /// The workbook is read completely before anything changes.
    pub fn import_workbook(&mut self, path: &Path) -> Result<ImportSummary> {
        let sheet = read_workbook(path)?;
        let (rows, warnings) = rows_from_sheet(&sheet, self.schema, &self.formulas);
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        let schema = self.schema;
        let mut update = SuggestionUpdate::default();
        for column in schema.suggestion_columns() {
            let (Some(key), Some(position)) = (&column.suggestion_key, schema.position(&column.name))
            else {
                continue;
            };
            let values = rows
                .iter()
                .filter_map(|row| row.get(position).and_then(RowCell::as_literal));
            self.suggestions.stage(&mut update, key, values);
        }
        let suggestions_added = update.added();

        let globals = self.globals.clone();
        self.persist_with(&globals, &rows, update)?;
        self.rows = rows;

        let summary = ImportSummary {
            rows: self.rows.len(),
            suggestions_added,
            warnings,
        };
        log::info!(
            "Imported {} rows from {} ({} new suggestions)",
            summary.rows,
            path.display(),
            summary.suggestions_added
        );
        Ok(summary)
    }

    /// Suggestions for `field` (a column name or suggestion key) that
    /// complete `prefix`
    pub fn suggest(&self, field: &str, prefix: &str) -> Result<Vec<&str>> {
        let key = self
            .schema
            .column(field)
            .and_then(|c| c.suggestion_key.as_deref())
            .or_else(|| {
                self.schema
                    .suggestion_columns()
                    .filter_map(|c| c.suggestion_key.as_deref())
                    .find(|k| *k == field)
            })
            .ok_or_else(|| Error::UnknownColumn(field.to_string()))?;
        Ok(self.suggestions.matches(key, prefix))
    }

    /// Persist the rows and globals to `session.json`
    pub fn save(&self) -> Result<()> {
        self.persist(&self.globals, &self.rows)
    }

    fn persist(&self, globals: &FieldValues, rows: &[MaterializedRow]) -> Result<()> {
        let state = SessionStateRef { globals, rows };
        atomic_write(self.config.session_path(), |file| -> Result<()> {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &state)?;
            writer.flush()?;
            Ok(())
        })
    }

    /// Save the session, then the staged suggestions
    ///
    /// If the suggestions cannot be written the previous session file is
    /// put back, so a failure leaves both as they were.
    fn persist_with(
        &mut self,
        globals: &FieldValues,
        rows: &[MaterializedRow],
        update: SuggestionUpdate,
    ) -> Result<()> {
        self.persist(globals, rows)?;
        if update.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.suggestions.commit(update) {
            if let Err(restore) = self.persist(&self.globals, &self.rows) {
                let path = self.config.session_path();
                log::warn!("Cannot restore {}: {}", path.display(), restore);
            }
            return Err(e);
        }
        Ok(())
    }

    fn row_index(&self, row: usize) -> Result<usize> {
        if row == 0 || row > self.rows.len() {
            return Err(Error::RowOutOfRange {
                row,
                len: self.rows.len(),
            });
        }
        Ok(row - 1)
    }

    fn check_fields(&self, values: &FieldValues, expected: ColumnKind) -> Result<()> {
        for name in values.keys() {
            let kind = self
                .schema
                .kind_of(name)
                .ok_or_else(|| Error::UnknownColumn(name.clone()))?;
            if kind != expected {
                return Err(Error::WrongCategory {
                    column: name.clone(),
                    kind,
                });
            }
        }
        Ok(())
    }

    fn stage_suggestions(&self, row: &MaterializedRow) -> SuggestionUpdate {
        let schema = self.schema;
        let mut update = SuggestionUpdate::default();
        for column in schema.suggestion_columns() {
            let (Some(key), Some(cell)) = (&column.suggestion_key, row.cell(schema, &column.name))
            else {
                continue;
            };
            if let Some(value) = cell.as_literal() {
                self.suggestions.stage(&mut update, key, [value]);
            }
        }
        update
    }
}

/// Borrowed form of [`SessionState`] for saving
#[derive(Serialize)]
struct SessionStateRef<'a> {
    globals: &'a FieldValues,
    rows: &'a [MaterializedRow],
}

fn load_state(path: &Path, schema: &ColumnSchema) -> Result<SessionState> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SessionState::default()),
        Err(e) => return Err(e.into()),
    };
    let invalid = |message: String| Error::InvalidSession {
        path: path.to_path_buf(),
        message,
    };
    let state: SessionState =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| invalid(e.to_string()))?;
    if let Some((i, row)) = state
        .rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != schema.len())
    {
        return Err(invalid(format!(
            "row {} has {} cells, expected {}",
            i + 1,
            row.len(),
            schema.len()
        )));
    }
    Ok(state)
}
