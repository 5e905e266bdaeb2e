//! CLI commands for reports
//!
//! Provides commands for defining, rendering and exporting reports.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};
use serde::Deserialize;

use crate::display::{format_report_definition, format_report_list};
use crate::error::{LedgerError, LedgerResult};
use crate::export::{export_report_csv, export_report_json, export_report_yaml};
use crate::models::{FormulaRow, ReportColumn, ReportDefinition};
use crate::services::{DatabaseService, ReportInput, ReportService};
use crate::storage::Storage;

use super::database::find_database;

/// Output format for `report export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Yaml,
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Define a report from a JSON definition file
    Create {
        /// Report name
        name: String,
        /// Database the report reads from (name or ID)
        #[arg(short, long)]
        database: String,
        /// JSON file with `columns` and optional `formulaRows`
        #[arg(short = 'f', long)]
        definition: PathBuf,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },
    /// Replace a report's columns and formula rows
    Update {
        /// Report name or ID
        report: String,
        /// JSON file with `columns` and optional `formulaRows`
        #[arg(short = 'f', long)]
        definition: PathBuf,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List reports
    List {
        /// Only reports over this database
        #[arg(short, long)]
        database: Option<String>,
    },
    /// Render a report in the terminal
    Show {
        /// Report name or ID
        report: String,
        /// Print the definition instead of rendering it
        #[arg(long)]
        definition: bool,
    },
    /// Render a report and export it
    Export {
        /// Report name or ID
        report: String,
        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a report
    Delete {
        /// Report name or ID
        report: String,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionFile {
    columns: Vec<ReportColumn>,
    #[serde(default)]
    formula_rows: Vec<FormulaRow>,
    #[serde(default)]
    description: Option<String>,
}

/// Handle report commands
pub fn handle_report_command(storage: &Storage, cmd: ReportCommands) -> LedgerResult<()> {
    let service = ReportService::new(storage);
    let databases = DatabaseService::new(storage);

    match cmd {
        ReportCommands::Create {
            name,
            database,
            definition,
            description,
        } => {
            let target = find_database(&databases, &database)?;
            let file = read_definition_file(&definition)?;

            let report = service.create_report(ReportInput {
                name,
                description: description.or(file.description).unwrap_or_default(),
                database_id: target.id,
                columns: file.columns,
                formula_rows: file.formula_rows,
            })?;

            println!("Created report: {}", report.name);
            println!("  Database: {}", target.name);
            println!("  Columns:  {}", report.columns.len());
            println!("  ID:       {}", report.id);
        }

        ReportCommands::Update {
            report,
            definition,
            name,
        } => {
            let existing = find_report(&service, &report)?;
            let file = read_definition_file(&definition)?;

            let updated = service.update_report(
                existing.id,
                ReportInput {
                    name: name.unwrap_or_else(|| existing.name.clone()),
                    description: file.description.unwrap_or(existing.description),
                    database_id: existing.database_id,
                    columns: file.columns,
                    formula_rows: file.formula_rows,
                },
            )?;
            println!("Updated report: {}", updated.name);
        }

        ReportCommands::List { database } => {
            let reports = match database {
                Some(identifier) => {
                    let target = find_database(&databases, &identifier)?;
                    service.list_for_database(target.id)?
                }
                None => service.list()?,
            };
            print!("{}", format_report_list(&reports, &databases.list()?));
        }

        ReportCommands::Show { report, definition } => {
            let found = find_report(&service, &report)?;
            if definition {
                print!("{}", format_report_definition(&found));
            } else {
                let rendered = service.render_report(found.id)?;
                print!("{}", rendered.format_terminal());
            }
        }

        ReportCommands::Export {
            report,
            format,
            output,
        } => {
            let found = find_report(&service, &report)?;
            let rendered = service.render_report(found.id)?;

            match output {
                Some(path) => {
                    let file = File::create(&path).map_err(|e| {
                        LedgerError::Export(format!(
                            "Failed to create file {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    let mut writer = BufWriter::new(file);
                    write_export(&rendered, format, &mut writer)?;
                    writer
                        .flush()
                        .map_err(|e| LedgerError::Export(e.to_string()))?;
                    println!("Report exported to: {}", path.display());
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut handle = stdout.lock();
                    write_export(&rendered, format, &mut handle)?;
                }
            }
        }

        ReportCommands::Delete { report } => {
            let found = find_report(&service, &report)?;
            service.delete_report(found.id)?;
            println!("Deleted report: {}", found.name);
        }
    }

    Ok(())
}

fn write_export<W: Write>(
    report: &crate::reports::RenderedReport,
    format: ExportFormat,
    writer: &mut W,
) -> LedgerResult<()> {
    match format {
        ExportFormat::Csv => export_report_csv(report, writer),
        ExportFormat::Json => export_report_json(report, writer),
        ExportFormat::Yaml => export_report_yaml(report, writer),
    }
}

fn find_report(service: &ReportService<'_>, identifier: &str) -> LedgerResult<ReportDefinition> {
    service
        .find(identifier)?
        .ok_or_else(|| LedgerError::report_not_found(identifier))
}

fn read_definition_file(path: &Path) -> LedgerResult<DefinitionFile> {
    let file = File::open(path)
        .map_err(|e| LedgerError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        LedgerError::Validation(format!(
            "Invalid report definition {}: {}",
            path.display(),
            e
        ))
    })
}
