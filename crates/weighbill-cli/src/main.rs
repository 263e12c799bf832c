//! weighbill CLI - purchase-bill entry and export

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use weighbill::{column_to_letters, Config, EntrySession, FieldValues};

#[derive(Parser)]
#[command(name = "weighbill")]
#[command(author, version, about = "Purchase-bill entry with spreadsheet export")]
struct Cli {
    /// Data directory (default: $WEIGHBILL_HOME, then the platform data dir)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bill columns with their category
    Schema,

    /// Add a row
    Add {
        /// Global value, kept for later rows (Name=Value)
        #[arg(short, long = "global", value_parser = parse_assignment)]
        global: Vec<(String, String)>,

        /// Row value (Name=Value)
        #[arg(short, long = "field", value_parser = parse_assignment)]
        field: Vec<(String, String)>,
    },

    /// Print the rows as entered
    List,

    /// Change input cells of a row
    Edit {
        /// Row number (1-based)
        row: usize,

        /// New values (Name=Value)
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },

    /// Delete rows
    Delete {
        /// Row numbers (1-based)
        #[arg(required = true)]
        rows: Vec<usize>,
    },

    /// Remove all rows
    Clear,

    /// Validate the rows
    Check,

    /// Export the rows to a workbook and clear them
    Submit {
        /// Output file (default: exports/<timestamp>.xlsx in the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Refuse to export when validation fails
        #[arg(long)]
        strict: bool,
    },

    /// Inspect or change the formula store
    Formulas {
        #[command(subcommand)]
        action: FormulaAction,
    },

    /// Replace the rows with the contents of a workbook
    Import {
        /// Workbook to read
        path: PathBuf,
    },

    /// Print stored values of a field that start with a prefix
    Suggest {
        /// Column name or suggestion key
        field: String,

        /// Text typed so far
        #[arg(default_value = "")]
        prefix: String,
    },
}

#[derive(Subcommand)]
enum FormulaAction {
    /// List every stored formula
    List,
    /// Set the formula of a column
    Set {
        /// Formula column
        column: String,
        /// Expression, e.g. "=[Bags] * 0.02"
        expression: String,
    },
    /// Restore the built-in formulas
    Reset,
    /// Check the stored formulas
    Lint,
    /// Show the formula behind a cell
    Show {
        /// Row number (1-based)
        row: usize,
        /// Column name
        column: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env(cli.home).context("Failed to read configuration")?;
    let mut session = EntrySession::open(config).context("Failed to open the entry session")?;

    match cli.command {
        Commands::Schema => show_schema(&session),
        Commands::Add { global, field } => add_row(&mut session, global, field),
        Commands::List => list_rows(&session),
        Commands::Edit { row, values } => {
            session
                .edit_row(row, &values.into_iter().collect())
                .with_context(|| format!("Failed to edit row {}", row))?;
            println!("Updated row {}", row);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Delete { rows } => {
            let removed = session.delete_rows(&rows).context("Failed to delete rows")?;
            println!("Deleted {} rows", removed);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clear => {
            let removed = session.clear().context("Failed to clear rows")?;
            println!("Cleared {} rows", removed);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let report = session.check_entries();
            println!("{}", report);
            Ok(if report.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Submit { output, strict } => submit(&mut session, output.as_deref(), strict),
        Commands::Formulas { action } => formulas(&mut session, action),
        Commands::Import { path } => {
            let summary = session
                .import_workbook(&path)
                .with_context(|| format!("Failed to import '{}'", path.display()))?;
            for warning in &summary.warnings {
                eprintln!("Warning: {}", warning);
            }
            println!(
                "Imported {} rows ({} new suggestions)",
                summary.rows, summary.suggestions_added
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Suggest { field, prefix } => {
            for value in session.suggest(&field, &prefix)? {
                println!("{}", value);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // The fmt subscriber also installs the `log` bridge for the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse `Name=Value`; the name may itself contain spaces and brackets
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Name=Value, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

fn show_schema(session: &EntrySession) -> Result<ExitCode> {
    for (position, column) in session.schema().columns().iter().enumerate() {
        let suggestions = match &column.suggestion_key {
            Some(key) => format!("  (suggestions: {})", key),
            None => String::new(),
        };
        println!(
            "{:>3}  {:<30} {}{}",
            column_to_letters(position as u32),
            column.name,
            column.kind.as_str(),
            suggestions
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn add_row(
    session: &mut EntrySession,
    global: Vec<(String, String)>,
    field: Vec<(String, String)>,
) -> Result<ExitCode> {
    let globals: FieldValues = global.into_iter().collect();
    let inputs: FieldValues = field.into_iter().collect();
    let row = session
        .add_row(&globals, &inputs)
        .context("Failed to add row")?;
    tracing::info!(row, "row added");
    println!("Added row {}", row);
    Ok(ExitCode::SUCCESS)
}

fn list_rows(session: &EntrySession) -> Result<ExitCode> {
    if session.rows().is_empty() {
        println!("No rows");
        return Ok(ExitCode::SUCCESS);
    }
    let schema = session.schema();
    for (i, row) in session.rows().iter().enumerate() {
        println!("Row {}", i + 1);
        for (column, value) in schema.columns().iter().zip(row.display_values()) {
            if !value.is_empty() {
                println!("  {:<30} {}", column.name, value);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn submit(session: &mut EntrySession, output: Option<&Path>, strict: bool) -> Result<ExitCode> {
    let result = if strict {
        session.submit_validated(output)
    } else {
        session.submit(output)
    };
    let report = match result {
        Ok(report) => report,
        Err(weighbill::Error::Validation(report)) => {
            eprintln!("{}", report);
            bail!("Entries are not valid; nothing was exported");
        }
        Err(e) => return Err(e).context("Failed to submit"),
    };

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!(
        "Exported {} rows to '{}'",
        report.rows,
        report.path.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn formulas(session: &mut EntrySession, action: FormulaAction) -> Result<ExitCode> {
    let issues = match action {
        FormulaAction::List => {
            for (column, definition) in session.formulas().iter() {
                println!("{:<30} {}", column, definition.formula);
            }
            return Ok(ExitCode::SUCCESS);
        }
        FormulaAction::Show { row, column } => {
            let expression = session.formula_for(row, &column)?;
            println!("{}", expression);
            return Ok(ExitCode::SUCCESS);
        }
        FormulaAction::Set { column, expression } => session
            .set_formula(&column, &expression)
            .context("Failed to save formulas")?,
        FormulaAction::Reset => session
            .reset_formulas()
            .context("Failed to save formulas")?,
        FormulaAction::Lint => {
            let issues = session.lint_formulas();
            if issues.is_empty() {
                println!("No problems found");
                return Ok(ExitCode::SUCCESS);
            }
            for issue in &issues {
                println!("{}", issue);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    for issue in &issues {
        eprintln!("Warning: {}", issue);
    }
    println!("Saved formulas to '{}'", session.config().formulas_path().display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Bill Wt (Qtl)=52.5"),
            Ok(("Bill Wt (Qtl)".to_string(), "52.5".to_string()))
        );
        assert_eq!(
            parse_assignment("Note=a=b"),
            Ok(("Note".to_string(), "a=b".to_string()))
        );
        assert!(parse_assignment("Bags").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_add_args() {
        let cli = Cli::try_parse_from([
            "weighbill",
            "--home",
            "/tmp/wb",
            "add",
            "-g",
            "Sauda=2400",
            "-f",
            "Bags=10",
            "-f",
            "Bill No.=B1",
        ])
        .unwrap();
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/wb")));
        match cli.command {
            Commands::Add { global, field } => {
                assert_eq!(global, vec![("Sauda".to_string(), "2400".to_string())]);
                assert_eq!(field.len(), 2);
            }
            _ => panic!("expected add"),
        }
    }
}
