//! End-to-end tests for the entry session: add, export, import

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weighbill::{
    Config, EntrySession, Error, FailureKind, FieldValues, FormulaSet, RowCell,
    UnresolvedPolicy, PLACEHOLDER,
};
use weighbill_core::{CellValue, NumberFormat};
use weighbill_xlsx::XlsxReader;

fn values(pairs: &[(&str, &str)]) -> FieldValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn col(session: &EntrySession, name: &str) -> u16 {
    session.schema().position(name).unwrap() as u16
}

fn valid_row(bill: &str) -> FieldValues {
    values(&[
        ("Bill No.", bill),
        ("Bill Date", "31/12/2024"),
        ("Bags", "120"),
        ("Bill Wt (Qtl)", "52.25"),
        ("Agent", "Ram Traders"),
    ])
}

#[test]
fn test_auto_increment_runs_one_to_n() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    for n in 0..5 {
        session
            .add_row(&FieldValues::new(), &valid_row(&format!("B{}", n)))
            .unwrap();
    }

    let schema = session.schema();
    let counters: Vec<_> = session
        .rows()
        .iter()
        .map(|r| r.cell(schema, "MRN No.").cloned())
        .collect();
    assert_eq!(
        counters,
        (1..=5).map(|n| Some(RowCell::Computed(n))).collect::<Vec<_>>()
    );
    assert_eq!(
        session.rows()[0].cell(schema, "Shortage").unwrap().display(),
        PLACEHOLDER
    );
}

#[test]
fn test_submit_writes_workbook_and_clears() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    session
        .add_row(
            &values(&[("Basic Rate as per Bill", "2,450")]),
            &values(&[("Bill No.", "ABC123"), ("Bags", "1,234.50")]),
        )
        .unwrap();
    session
        .add_row(&FieldValues::new(), &valid_row("B2"))
        .unwrap();

    let out = dir.path().join("out").join("bills.xlsx");
    let report = session.submit(Some(&out)).unwrap();
    assert_eq!(report.rows, 2);
    assert!(report.warnings.is_empty());
    assert!(session.rows().is_empty());

    let sheet = XlsxReader::read_file(&out).unwrap();
    assert_eq!(sheet.name(), "Data");
    assert_eq!(
        sheet.get_value_at(0, col(&session, "Bill No.")),
        CellValue::string("Bill No.")
    );

    let bags = sheet.cell_at(1, col(&session, "Bags")).unwrap();
    assert_eq!(bags.value, CellValue::Number(1234.5));
    assert_eq!(bags.style.number_format, NumberFormat::BuiltIn(4));
    assert_eq!(
        sheet.get_value_at(1, col(&session, "Bill No.")),
        CellValue::string("ABC123")
    );
    assert_eq!(
        sheet.get_value_at(2, col(&session, "Basic Rate as per Bill")),
        CellValue::Number(2450.0)
    );
    assert_eq!(
        sheet.get_value_at(2, col(&session, "Raw Material Value")),
        CellValue::formula("=S3 - AC3 - AD3 - AE3")
    );
    assert_eq!(
        sheet.get_value_at(2, col(&session, "MRN No.")),
        CellValue::Number(2.0)
    );

    let reopened = EntrySession::open(Config::new(dir.path())).unwrap();
    assert!(reopened.rows().is_empty());
}

#[test]
fn test_default_destination_is_timestamped() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    session
        .add_row(&FieldValues::new(), &valid_row("B1"))
        .unwrap();

    let report = session.submit(None).unwrap();
    assert_eq!(report.path.parent(), Some(dir.path().join("exports").as_path()));
    let name = report.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with(".xlsx"));
    assert_eq!(name.len(), "20241231_090507.xlsx".len());
    assert!(report.path.exists());
}

#[test]
fn test_failed_export_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::new(dir.path());
    config.unresolved = UnresolvedPolicy::Reject;
    let mut session = EntrySession::open(config).unwrap();
    session.set_formula("Shortage", "=[Bill Wt] - 1").unwrap();
    session
        .add_row(&FieldValues::new(), &valid_row("B1"))
        .unwrap();

    let out = dir.path().join("rejected.xlsx");
    let err = session.submit(Some(&out)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Resolution);
    assert_eq!(session.rows().len(), 1);
    assert!(!out.exists());
}

#[test]
fn test_strict_submit_gates_on_validation() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    session
        .add_row(&FieldValues::new(), &values(&[("Bags", "ten")]))
        .unwrap();

    let report = session.check_entries();
    assert_eq!(
        report.to_string(),
        "Row 1: Bill No. is empty\n\
         Row 1: Bill Date is empty\n\
         Row 1: Bill Wt (Qtl) is empty\n\
         Row 1: Bags must be numeric"
    );

    let err = session.submit_validated(None).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(session.rows().len(), 1);
}

#[test]
fn test_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    session
        .add_row(&FieldValues::new(), &valid_row("B1"))
        .unwrap();
    session
        .add_row(
            &FieldValues::new(),
            &values(&[("Bill No.", "B2"), ("City", "Karnal")]),
        )
        .unwrap();
    let before = session.rows().to_vec();

    let out = dir.path().join("round.xlsx");
    session.submit(Some(&out)).unwrap();

    // Start over in a fresh home so the suggestions are new
    let other = TempDir::new().unwrap();
    let mut fresh = EntrySession::open(Config::new(other.path())).unwrap();
    let summary = fresh.import_workbook(&out).unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.suggestions_added, 2);
    assert!(summary.warnings.is_empty());

    let schema = fresh.schema();
    assert_eq!(fresh.rows()[1].cell(schema, "MRN No."), Some(&RowCell::Computed(2)));
    for name in ["MRN No.", "Bill No.", "Bill Date", "Bags", "Bill Wt (Qtl)", "City", "Shortage"] {
        for (i, row) in fresh.rows().iter().enumerate() {
            assert_eq!(row.cell(schema, name), before[i].cell(schema, name), "{name}");
        }
    }
    assert_eq!(fresh.suggest("Agent", "ram").unwrap(), vec!["Ram Traders"]);
}

#[test]
fn test_import_failure_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    session
        .add_row(&FieldValues::new(), &valid_row("B1"))
        .unwrap();

    let bogus = dir.path().join("bogus.xlsx");
    fs::write(&bogus, "not a zip").unwrap();
    let err = session.import_workbook(&bogus).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Import);
    assert_eq!(session.rows().len(), 1);
}

#[test]
fn test_formula_store_fallbacks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("formulas.json");

    assert_eq!(FormulaSet::load(&path), FormulaSet::defaults());

    fs::write(&path, r#"{"Shortage": {"formula": "=[Bags"#).unwrap();
    assert_eq!(FormulaSet::load(&path), FormulaSet::defaults());

    let session = EntrySession::open(Config::new(dir.path())).unwrap();
    assert_eq!(session.formulas(), &FormulaSet::defaults());
}

#[test]
fn test_suggestions_recorded_on_add() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    session
        .add_row(
            &FieldValues::new(),
            &values(&[("Party Name", "Shree Ganesh"), ("Mkt Committee", "Karnal")]),
        )
        .unwrap();

    let text = fs::read_to_string(dir.path().join("suggestions/party_name_suggestions.json"))
        .unwrap();
    let stored: Vec<String> = serde_json::from_str(&text).unwrap();
    assert_eq!(stored, vec!["Shree Ganesh"]);
    assert_eq!(
        session.suggest("Mkt Committee", "k").unwrap(),
        vec!["Karnal"]
    );
}

#[test]
fn test_failed_session_write_keeps_suggestions() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    fs::create_dir(dir.path().join("session.json")).unwrap();

    let err = session
        .add_row(&FieldValues::new(), &valid_row("B1"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Io);
    assert!(session.rows().is_empty());
    assert!(session.suggest("Agent", "ram").unwrap().is_empty());
    assert!(!dir.path().join("suggestions/agent_suggestions.json").exists());
}

#[test]
fn test_failed_suggestion_write_restores_session() {
    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    fs::write(dir.path().join("suggestions"), "not a directory").unwrap();

    assert!(session
        .add_row(&FieldValues::new(), &valid_row("B1"))
        .is_err());
    assert!(session.rows().is_empty());

    let reopened = EntrySession::open(Config::new(dir.path())).unwrap();
    assert!(reopened.rows().is_empty());
}

#[test]
fn test_failed_import_write_keeps_suggestions() {
    let source = TempDir::new().unwrap();
    let mut exporter = EntrySession::open(Config::new(source.path())).unwrap();
    exporter
        .add_row(&FieldValues::new(), &valid_row("B1"))
        .unwrap();
    let workbook = source.path().join("bills.xlsx");
    exporter.submit(Some(&workbook)).unwrap();

    let dir = TempDir::new().unwrap();
    let mut session = EntrySession::open(Config::new(dir.path())).unwrap();
    fs::create_dir(dir.path().join("session.json")).unwrap();

    assert!(session.import_workbook(&workbook).is_err());
    assert!(session.rows().is_empty());
    assert!(session.suggest("Agent", "ram").unwrap().is_empty());
    assert!(!dir.path().join("suggestions/agent_suggestions.json").exists());
}
