//! Entry validation
//!
//! Rows are checked independently against three rule sets: required fields,
//! numeric fields and one date field. Checking is advisory; nothing here
//! stops an export.

use std::fmt;

use chrono::NaiveDate;
use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};

use crate::cell::parse_decimal;
use crate::row::{MaterializedRow, RowCell};
use crate::schema::ColumnSchema;

/// Which numeric fields report parse failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericCheck {
    /// Only numeric fields that are also required are reported.
    /// Optional numeric fields accept any text.
    #[default]
    RequiredOnly,
    /// Every numeric field is reported
    All,
}

impl NumericCheck {
    /// Parse a policy name (`required` or `all`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "required" | "required_only" => Some(NumericCheck::RequiredOnly),
            "all" => Some(NumericCheck::All),
            _ => None,
        }
    }
}

/// Rules applied by [`validate`]
/// `chrono` format of the bill date
pub const BILL_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Fields that must be non-blank
    pub required: Vec<String>,
    /// Fields that must be blank or parse as a number (commas allowed)
    pub numeric: Vec<String>,
    /// Field that must be blank or a date in `date_format`
    pub date_field: Option<String>,
    /// `chrono` format string for `date_field`
    pub date_format: String,
    /// Human-readable form of `date_format`, used in messages
    pub date_format_label: String,
    /// Numeric reporting policy
    pub numeric_check: NumericCheck,
}

impl ValidationRules {
    /// Rules for the built-in bill schema
    pub fn bill() -> Self {
        Self {
            required: ["Bill No.", "Bill Date", "Bags", "Bill Wt (Qtl)"]
                .into_iter()
                .map(String::from)
                .collect(),
            numeric: [
                "Bags",
                "Bill Wt (Qtl)",
                "Kanda Wt with Bardana(Qtl)",
                "Basic Rate as per Bill",
                "Sauda",
                "Moist(%)",
                "Fungus",
                "Broken",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            date_field: Some("Bill Date".into()),
            date_format: BILL_DATE_FORMAT.into(),
            date_format_label: "DD/MM/YYYY".into(),
            numeric_check: NumericCheck::RequiredOnly,
        }
    }

    /// Same rules with a different numeric policy
    pub fn with_numeric_check(mut self, check: NumericCheck) -> Self {
        self.numeric_check = check;
        self
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::bill()
    }
}

/// What went wrong with a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required field is blank
    Empty,
    /// A numeric field does not parse
    NotNumeric,
    /// The date field does not match the expected format
    BadDate {
        /// Expected format, as shown to users
        expected: String,
    },
}

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// 1-based data row number
    pub row: usize,
    /// Field name
    pub field: String,
    /// Failure
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::Empty => write!(f, "Row {}: {} is empty", self.row, self.field),
            ValidationErrorKind::NotNumeric => {
                write!(f, "Row {}: {} must be numeric", self.row, self.field)
            }
            ValidationErrorKind::BadDate { expected } => write!(
                f,
                "Row {}: {} must be in {} format",
                self.row, self.field, expected
            ),
        }
    }
}

/// Combined result of checking every row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Errors in row order
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// True when no check failed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failed checks
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check whether the report is empty
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "All entries are valid");
        }
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl From<Vec<ValidationError>> for ValidationReport {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

/// Check every row against `rules`
///
/// Fields named in the rules but missing from the schema are skipped.
pub fn validate(
    rows: &[MaterializedRow],
    schema: &ColumnSchema,
    rules: &ValidationRules,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let row_num = i + 1;

        for field in &rules.required {
            if let Some(cell) = row.cell(schema, field) {
                if cell.is_blank() {
                    errors.push(ValidationError {
                        row: row_num,
                        field: field.clone(),
                        kind: ValidationErrorKind::Empty,
                    });
                }
            }
        }

        for field in &rules.numeric {
            let reported = match rules.numeric_check {
                NumericCheck::All => true,
                NumericCheck::RequiredOnly => rules.required.contains(field),
            };
            if !reported {
                continue;
            }
            if let Some(cell) = row.cell(schema, field) {
                if !is_blank_or_numeric(cell) {
                    errors.push(ValidationError {
                        row: row_num,
                        field: field.clone(),
                        kind: ValidationErrorKind::NotNumeric,
                    });
                }
            }
        }

        if let Some(field) = &rules.date_field {
            if let Some(cell) = row.cell(schema, field) {
                if !is_blank_or_date(cell, &rules.date_format) {
                    errors.push(ValidationError {
                        row: row_num,
                        field: field.clone(),
                        kind: ValidationErrorKind::BadDate {
                            expected: rules.date_format_label.clone(),
                        },
                    });
                }
            }
        }
    }

    errors
}

fn is_blank_or_numeric(cell: &RowCell) -> bool {
    match cell {
        RowCell::Computed(_) => true,
        RowCell::Pending => false,
        RowCell::Literal(s) => s.trim().is_empty() || parse_decimal(s).is_some(),
    }
}

fn is_blank_or_date(cell: &RowCell, format: &str) -> bool {
    match cell {
        RowCell::Literal(s) if s.is_empty() => true,
        RowCell::Literal(s) => {
            has_date_shape(s, format) && NaiveDate::parse_from_str(s, format).is_ok()
        }
        _ => false,
    }
}

/// chrono's `%Y` takes any number of digits and a sign; the bill date wants
/// exactly four
fn has_date_shape(s: &str, format: &str) -> bool {
    match format {
        BILL_DATE_FORMAT => regex_is_match!(r"^[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}$", s),
        _ => true,
    }
}
