//! Sheetsmith - spreadsheet manipulation from the command line.
//!
//! Every subcommand prints one JSON document to stdout: the operation's
//! result, or `{"kind": ..., "message": ...}` with exit status 1.

mod config;
mod logger;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

use sheetsmith_core::{ChartLabels, ErrorReport, FormatOptions, PivotOptions, Session};

#[derive(Parser)]
#[command(name = "sheetsmith", version)]
#[command(about = "Create, edit and inspect spreadsheet workbooks.")]
struct Cli {
    /// Config file (default: the platform config directory's config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output on stderr (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty workbook with one sheet.
    CreateWorkbook { path: String },

    /// Add a sheet to a workbook.
    CreateWorksheet { path: String, sheet: String },

    /// List sheets, with used and merged ranges when asked.
    GetWorkbookMetadata {
        path: String,
        #[arg(long)]
        include_ranges: bool,
    },

    /// Write rows of values. `--data` is a JSON array of arrays; read from
    /// stdin when omitted.
    WriteDataToExcel {
        path: String,
        sheet: String,
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        start_cell: Option<String>,
    },

    /// Read a block of values as JSON rows.
    ReadDataFromExcel {
        path: String,
        sheet: String,
        #[arg(long)]
        start_cell: Option<String>,
        #[arg(long)]
        end_cell: Option<String>,
        #[arg(long)]
        preview_only: bool,
    },

    /// Apply formatting given as a JSON object of options.
    FormatRange {
        path: String,
        sheet: String,
        start_cell: String,
        #[arg(long)]
        end_cell: Option<String>,
        #[arg(long, default_value = "{}")]
        options: String,
    },

    MergeCells {
        path: String,
        sheet: String,
        start_cell: String,
        end_cell: String,
    },

    UnmergeCells {
        path: String,
        sheet: String,
        start_cell: String,
        end_cell: String,
    },

    /// Store formula text in a cell after a syntax check.
    ApplyFormula {
        path: String,
        sheet: String,
        cell: String,
        formula: String,
    },

    /// Check formula text without changing the workbook.
    ValidateFormulaSyntax {
        path: String,
        sheet: String,
        cell: String,
        formula: String,
    },

    /// Place a chart (line, bar, pie, scatter or area).
    CreateChart {
        path: String,
        sheet: String,
        data_range: String,
        chart_type: String,
        target_cell: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        x_axis: Option<String>,
        #[arg(long)]
        y_axis: Option<String>,
    },

    /// Summarize a headed range into a pivot table.
    CreatePivotTable {
        path: String,
        sheet: String,
        data_range: String,
        #[arg(long)]
        target_cell: Option<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        rows: Vec<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// sum, count, average, max or min (default average).
        #[arg(long)]
        agg_func: Option<String>,
    },

    CopyWorksheet {
        path: String,
        source: String,
        target: String,
    },

    DeleteWorksheet { path: String, sheet: String },

    RenameWorksheet {
        path: String,
        old_name: String,
        new_name: String,
    },

    /// Copy a block of cells. Formula text is copied as-is.
    CopyRange {
        path: String,
        sheet: String,
        source_start: String,
        target_start: String,
        #[arg(long)]
        source_end: Option<String>,
        #[arg(long)]
        target_sheet: Option<String>,
    },

    /// Delete a range, shifting cells up (default) or left.
    DeleteRange {
        path: String,
        sheet: String,
        start_cell: String,
        #[arg(long)]
        end_cell: Option<String>,
        #[arg(long)]
        shift_direction: Option<String>,
    },

    /// Describe a range and how it sits against the used range.
    ValidateExcelRange {
        path: String,
        sheet: String,
        start_cell: String,
        #[arg(long)]
        end_cell: Option<String>,
    },
}

fn message(text: String) -> Value {
    Value::String(text)
}

fn dispatch(session: &Session, command: Command) -> sheetsmith_core::Result<Value> {
    let value = match command {
        Command::CreateWorkbook { path } => message(session.create_workbook(&path)?),
        Command::CreateWorksheet { path, sheet } => {
            message(session.create_worksheet(&path, &sheet)?)
        }
        Command::GetWorkbookMetadata {
            path,
            include_ranges,
        } => serde_json::to_value(session.get_workbook_metadata(&path, include_ranges)?)?,
        Command::WriteDataToExcel {
            path,
            sheet,
            data,
            start_cell,
        } => {
            let data = match data {
                Some(data) => data,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            let rows: Vec<Vec<Value>> = serde_json::from_str(&data)?;
            message(session.write_data_to_excel(&path, &sheet, &rows, start_cell.as_deref())?)
        }
        Command::ReadDataFromExcel {
            path,
            sheet,
            start_cell,
            end_cell,
            preview_only,
        } => serde_json::to_value(session.read_data_from_excel(
            &path,
            &sheet,
            start_cell.as_deref(),
            end_cell.as_deref(),
            preview_only,
        )?)?,
        Command::FormatRange {
            path,
            sheet,
            start_cell,
            end_cell,
            options,
        } => {
            let options: FormatOptions = serde_json::from_str(&options)?;
            message(session.format_range(
                &path,
                &sheet,
                &start_cell,
                end_cell.as_deref(),
                &options,
            )?)
        }
        Command::MergeCells {
            path,
            sheet,
            start_cell,
            end_cell,
        } => message(session.merge_cells(&path, &sheet, &start_cell, &end_cell)?),
        Command::UnmergeCells {
            path,
            sheet,
            start_cell,
            end_cell,
        } => message(session.unmerge_cells(&path, &sheet, &start_cell, &end_cell)?),
        Command::ApplyFormula {
            path,
            sheet,
            cell,
            formula,
        } => message(session.apply_formula(&path, &sheet, &cell, &formula)?),
        Command::ValidateFormulaSyntax {
            path,
            sheet,
            cell,
            formula,
        } => serde_json::to_value(session.validate_formula_syntax(&path, &sheet, &cell, &formula)?)?,
        Command::CreateChart {
            path,
            sheet,
            data_range,
            chart_type,
            target_cell,
            title,
            x_axis,
            y_axis,
        } => serde_json::to_value(session.create_chart(
            &path,
            &sheet,
            &data_range,
            &chart_type,
            &target_cell,
            ChartLabels {
                title,
                x_axis,
                y_axis,
            },
        )?)?,
        Command::CreatePivotTable {
            path,
            sheet,
            data_range,
            target_cell,
            rows,
            values,
            columns,
            agg_func,
        } => serde_json::to_value(session.create_pivot_table(
            &path,
            &sheet,
            &data_range,
            target_cell.as_deref(),
            &PivotOptions {
                rows,
                values,
                columns,
                agg_func,
            },
        )?)?,
        Command::CopyWorksheet {
            path,
            source,
            target,
        } => message(session.copy_worksheet(&path, &source, &target)?),
        Command::DeleteWorksheet { path, sheet } => {
            message(session.delete_worksheet(&path, &sheet)?)
        }
        Command::RenameWorksheet {
            path,
            old_name,
            new_name,
        } => message(session.rename_worksheet(&path, &old_name, &new_name)?),
        Command::CopyRange {
            path,
            sheet,
            source_start,
            target_start,
            source_end,
            target_sheet,
        } => {
            let written = session.copy_range(
                &path,
                &sheet,
                &source_start,
                source_end.as_deref(),
                &target_start,
                target_sheet.as_deref(),
            )?;
            serde_json::json!({ "cells_written": written })
        }
        Command::DeleteRange {
            path,
            sheet,
            start_cell,
            end_cell,
            shift_direction,
        } => message(session.delete_range(
            &path,
            &sheet,
            &start_cell,
            end_cell.as_deref(),
            shift_direction.as_deref(),
        )?),
        Command::ValidateExcelRange {
            path,
            sheet,
            start_cell,
            end_cell,
        } => serde_json::to_value(session.validate_excel_range(
            &path,
            &sheet,
            &start_cell,
            end_cell.as_deref(),
        )?)?,
    };
    Ok(value)
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (config, warnings) = config::load_config(cli.config.as_deref());
    let (level, level_warning) = logger::level_for(&config.log_level, cli.verbose);
    logger::init(level)?;
    for warning in warnings.iter().chain(level_warning.iter()) {
        log::warn!("{warning}");
    }

    let session = Session::with_json_store(config);
    match dispatch(&session, cli.command) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            log::debug!("operation failed: {err:?}");
            let report = ErrorReport::from(&err);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
