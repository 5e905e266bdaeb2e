//! Database CLI commands
//!
//! Implements CLI commands for database management, row import and row
//! deletion.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Deserialize;

use crate::config::Settings;
use crate::display::{
    format_database_details, format_database_list, format_import_preview, format_import_result,
    format_rows,
};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{ColumnDefinition, Database, DatabaseSchema, Row};
use crate::services::{CreateDatabaseInput, DatabaseService, ImportService, ReportService};
use crate::storage::Storage;

/// Database subcommands
#[derive(Subcommand)]
pub enum DbCommands {
    /// Create a new database from a schema file
    Create {
        /// Database name
        name: String,
        /// JSON schema file: a column array, or an object with `columns`
        /// and optional `identifierKeys` and `description`
        #[arg(short, long)]
        schema: PathBuf,
        /// Identifier key column (repeat for a composite key)
        #[arg(short = 'k', long = "key")]
        identifier_keys: Vec<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Initial rows (CSV with a header row, or a JSON array of objects)
        #[arg(short, long)]
        rows: Option<PathBuf>,
    },
    /// List all databases
    List,
    /// Show a database's schema and a page of its rows
    Show {
        /// Database name or ID
        database: String,
        /// First row to show (0-based)
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Number of rows to show (defaults to the preview_rows setting)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Import rows from a CSV or JSON file
    Import {
        /// Database name or ID
        database: String,
        /// File to import (.json for a JSON array, anything else is read as CSV)
        file: PathBuf,
        /// Only show the preview; write nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete rows by identifier key value
    DeleteRows {
        /// Database name or ID
        database: String,
        /// Identifier value of one row; repeat once per identifier key, in
        /// key order. Values are taken verbatim, commas included.
        #[arg(short = 'v', long = "value", required_unless_present = "keys_file")]
        values: Vec<String>,
        /// JSON file holding an array of identifier tuples, e.g. [["A-1"], ["A-2"]]
        #[arg(long, conflicts_with = "values")]
        keys_file: Option<PathBuf>,
    },
    /// Rename a database
    Rename {
        /// Database name or ID
        database: String,
        /// New name
        new_name: String,
    },
    /// Delete a database and the reports built on it
    Delete {
        /// Database name or ID
        database: String,
    },
}

/// Object form of a schema file
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDocument {
    columns: Vec<ColumnDefinition>,
    #[serde(default)]
    identifier_keys: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Columns(Vec<ColumnDefinition>),
    Document(SchemaDocument),
}

/// Handle a database command
pub fn handle_db_command(storage: &Storage, settings: &Settings, cmd: DbCommands) -> LedgerResult<()> {
    let service = DatabaseService::new(storage).with_limits(settings.limits());

    match cmd {
        DbCommands::Create {
            name,
            schema,
            identifier_keys,
            description,
            rows,
        } => {
            let (columns, file_keys, file_description) = match read_schema_file(&schema)? {
                SchemaFile::Columns(columns) => (columns, Vec::new(), None),
                SchemaFile::Document(doc) => (doc.columns, doc.identifier_keys, doc.description),
            };
            let schema = DatabaseSchema::new(columns);

            let initial_rows = match rows {
                Some(path) => {
                    let (rows, warnings) = read_rows(storage, settings, &path, &schema)?;
                    print_warnings(&warnings);
                    rows
                }
                None => Vec::new(),
            };

            let database = service.create_database(CreateDatabaseInput {
                name,
                description: description.or(file_description).unwrap_or_default(),
                schema,
                identifier_keys: if identifier_keys.is_empty() {
                    file_keys
                } else {
                    identifier_keys
                },
                initial_rows,
            })?;

            println!("Created database: {}", database.name);
            println!("  Columns: {}", database.schema.columns.len());
            println!("  Rows:    {}", database.row_count);
            println!("  ID:      {}", database.id);
        }

        DbCommands::List => {
            let databases = service.list()?;
            print!("{}", format_database_list(&databases));
        }

        DbCommands::Show {
            database,
            offset,
            limit,
        } => {
            let found = find_database(&service, &database)?;
            let reports = ReportService::new(storage).list_for_database(found.id)?;
            print!("{}", format_database_details(&found, &reports));

            let page = service.query_rows(found.id, offset, limit.unwrap_or(settings.preview_rows))?;
            println!();
            print!("{}", format_rows(&found, &page));
        }

        DbCommands::Import {
            database,
            file,
            dry_run,
        } => {
            let found = find_database(&service, &database)?;
            let (rows, parse_warnings) = read_rows(storage, settings, &file, &found.schema)?;
            print_warnings(&parse_warnings);

            if rows.is_empty() {
                println!("No rows found in {}.", file.display());
                return Ok(());
            }

            let import_service = ImportService::new(storage).with_limits(settings.limits());
            let preview = import_service.preview_import(found.id, &rows)?;
            print!(
                "{}",
                format_import_preview(&found.name, &preview, settings.preview_rows)
            );

            if dry_run || !preview.valid {
                if !preview.valid {
                    return Err(LedgerError::Import(format!(
                        "{} row error(s); nothing was imported",
                        preview.errors.len()
                    )));
                }
                println!("\nDry run: nothing was written.");
                return Ok(());
            }

            let result = import_service.import_rows(found.id, &rows)?;
            println!();
            print!("{}", format_import_result(&result, settings.preview_rows));
            if !result.success {
                return Err(LedgerError::Import(result.errors.join("; ")));
            }
        }

        DbCommands::DeleteRows {
            database,
            values,
            keys_file,
        } => {
            let found = find_database(&service, &database)?;
            let tuples = match keys_file {
                Some(path) => read_keys_file(&path)?,
                None => vec![values],
            };

            let removed = service.delete_rows(found.id, &tuples)?;
            println!("Deleted {} row(s) from {}", removed, found.name);
        }

        DbCommands::Rename { database, new_name } => {
            let found = find_database(&service, &database)?;
            let renamed = service.rename(found.id, &new_name)?;
            println!("Renamed database: {} -> {}", found.name, renamed.name);
        }

        DbCommands::Delete { database } => {
            let found = find_database(&service, &database)?;
            let deleted = service.delete_database(found.id)?;
            println!("Deleted database: {}", deleted.database.name);
            for report in &deleted.reports {
                println!("  Removed report: {}", report.name);
            }
        }
    }

    Ok(())
}

/// Resolve a database by name or id
pub fn find_database(service: &DatabaseService<'_>, identifier: &str) -> LedgerResult<Database> {
    service
        .find(identifier)?
        .ok_or_else(|| LedgerError::database_not_found(identifier))
}

fn read_schema_file(path: &Path) -> LedgerResult<SchemaFile> {
    let file = File::open(path)
        .map_err(|e| LedgerError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        LedgerError::Validation(format!("Invalid schema file {}: {}", path.display(), e))
    })
}

fn read_keys_file(path: &Path) -> LedgerResult<Vec<Vec<String>>> {
    let file = File::open(path)
        .map_err(|e| LedgerError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        LedgerError::Validation(format!(
            "Invalid key file {} (expected an array of string arrays): {}",
            path.display(),
            e
        ))
    })
}

/// Read rows from a CSV or JSON file, returning them with header warnings
fn read_rows(
    storage: &Storage,
    settings: &Settings,
    path: &Path,
    schema: &DatabaseSchema,
) -> LedgerResult<(Vec<Row>, Vec<String>)> {
    let file = File::open(path)
        .map_err(|e| LedgerError::Import(format!("Failed to open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);
    let import_service = ImportService::new(storage).with_limits(settings.limits());

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Ok((import_service.parse_json_rows(reader)?, Vec::new()))
    } else {
        let parsed = import_service.parse_csv_rows(reader, schema)?;
        Ok((parsed.rows, parsed.warnings))
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}
