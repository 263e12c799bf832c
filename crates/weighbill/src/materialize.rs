//! Building display rows from entered values

use std::collections::BTreeMap;

use weighbill_core::{ColumnKind, ColumnSchema, MaterializedRow, RowCell};
use weighbill_formula::FormulaSet;

/// Entered values keyed by column name
pub type FieldValues = BTreeMap<String, String>;

/// Build the row added to the entry table
///
/// Input columns take their trimmed value from `globals` or `row_inputs`
/// according to their category (missing values are empty). A formula
/// column is [`RowCell::Pending`] when it has an expression, except the
/// auto-increment column which gets `current_row_count + 1` right away. A
/// formula column with no expression is an empty literal.
pub fn materialize(
    schema: &ColumnSchema,
    globals: &FieldValues,
    row_inputs: &FieldValues,
    formulas: &FormulaSet,
    current_row_count: usize,
) -> MaterializedRow {
    MaterializedRow::build(schema, |_, column| {
        let entered = |values: &FieldValues| {
            values
                .get(&column.name)
                .map(|v| RowCell::Literal(v.trim().to_string()))
                .unwrap_or_default()
        };
        match column.kind {
            ColumnKind::GlobalInput => entered(globals),
            ColumnKind::RowInput => entered(row_inputs),
            ColumnKind::Formula => match formulas.get(&column.name) {
                Some(def) if def.is_auto_increment() => {
                    RowCell::Computed(current_row_count as i64 + 1)
                }
                Some(def) if !def.is_blank() => RowCell::Pending,
                _ => RowCell::empty(),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weighbill_core::PLACEHOLDER;

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_bill_row() {
        let schema = ColumnSchema::bill();
        let row = materialize(
            schema,
            &values(&[("Basic Rate as per Bill", " 2450 ")]),
            &values(&[("Bill No.", "B-17"), ("Bags", "120")]),
            &FormulaSet::defaults(),
            4,
        );

        assert_eq!(row.len(), schema.len());
        assert_eq!(row.cell(schema, "MRN No."), Some(&RowCell::Computed(5)));
        assert_eq!(
            row.cell(schema, "Basic Rate as per Bill"),
            Some(&RowCell::Literal("2450".into()))
        );
        assert_eq!(row.cell(schema, "Bill Basic Amt"), Some(&RowCell::Pending));
        assert_eq!(row.cell(schema, "Agent"), Some(&RowCell::empty()));
        // Stored key is "Other Crs Amt", so the schema column has no formula
        assert_eq!(row.cell(schema, "Other Crs amt"), Some(&RowCell::empty()));
        assert_eq!(row.cell(schema, "Shortage").unwrap().display(), PLACEHOLDER);
    }

    #[test]
    fn test_values_go_by_category() {
        let schema = ColumnSchema::bill();
        // A global given as a row input is ignored, and the reverse
        let row = materialize(
            schema,
            &values(&[("Bags", "9")]),
            &values(&[("Sauda", "1")]),
            &FormulaSet::new(),
            0,
        );
        assert_eq!(row.cell(schema, "Bags"), Some(&RowCell::empty()));
        assert_eq!(row.cell(schema, "Sauda"), Some(&RowCell::empty()));
        assert_eq!(row.cell(schema, "MRN No."), Some(&RowCell::empty()));
    }

    #[test]
    fn test_auto_increment_counts_up() {
        let schema = ColumnSchema::bill();
        let formulas = FormulaSet::defaults();
        let counters: Vec<_> = (0..4)
            .map(|n| {
                materialize(schema, &FieldValues::new(), &FieldValues::new(), &formulas, n)
                    .cell(schema, "MRN No.")
                    .cloned()
            })
            .collect();
        assert_eq!(
            counters,
            (1..=4).map(|n| Some(RowCell::Computed(n))).collect::<Vec<_>>()
        );
    }
}
