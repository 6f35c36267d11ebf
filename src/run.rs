use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::RunConfig;
use crate::convert::{ConvertOptions, ConverterRegistry};
use crate::error::{Result, ToolError};
use crate::extract::{IGNORE_MARKER, extract_sheet};
use crate::io::WorkbookSource;
use crate::io::excel_read::open_workbook;
use crate::io::export::{ExportFormat, export_sheet};
use crate::model::SheetResult;

/// File extensions picked up when scanning the input directory.
pub const WORKBOOK_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xls"];

/// What happens when a sheet fails to parse or convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the whole run at the first failure.
    #[default]
    Abort,
    /// Record the failure and continue with the next sheet.
    SkipSheet,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Path substrings excluding a workbook.
    pub excludes: Vec<String>,
    pub on_error: ErrorPolicy,
    pub convert: ConvertOptions,
}

/// A sheet (or whole workbook, when `sheet` is `None`) skipped under
/// [`ErrorPolicy::SkipSheet`].
#[derive(Debug, Clone, PartialEq)]
pub struct SheetFailure {
    pub file: PathBuf,
    pub sheet: Option<String>,
    pub message: String,
}

/// Counts and per-sheet results of one run, in file then sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub files_scanned: usize,
    pub files_excluded: usize,
    /// Sheets skipped by the ignore marker or because they are blank.
    pub sheets_ignored: usize,
    pub sheets_attempted: usize,
    pub sheets_completed: usize,
    pub failures: Vec<SheetFailure>,
    pub results: Vec<SheetResult>,
}

/// Whether `path` contains any of the exclusion patterns.
pub fn is_excluded(path: &Path, excludes: &[String]) -> bool {
    let text = path.to_string_lossy();
    excludes.iter().any(|pattern| text.contains(pattern.as_str()))
}

/// Lists the workbooks directly inside `dir`, sorted by file name. Office
/// lock files (`~$name.xlsx`) are left out.
pub fn scan_workbooks(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with("~$") {
            continue;
        }
        let is_workbook = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                WORKBOOK_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
            });
        if is_workbook {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Scans `input` and extracts every workbook found there.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn run_directory(input: &Path, options: &RunOptions) -> Result<RunReport> {
    if !input.is_dir() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }
    let files = scan_workbooks(input)?;
    info!(files = files.len(), "workbooks found");
    run_with(&files, options, open_workbook)
}

/// Extracts `files` in order, opening each one with `open`.
pub fn run_with<S, F>(files: &[PathBuf], options: &RunOptions, mut open: F) -> Result<RunReport>
where
    S: WorkbookSource,
    F: FnMut(&Path) -> Result<S>,
{
    let registry = ConverterRegistry::new(options.convert);
    let mut report = RunReport::default();

    for file in files {
        if is_excluded(file, &options.excludes) {
            info!(file = %file.display(), "workbook excluded");
            report.files_excluded += 1;
            continue;
        }
        report.files_scanned += 1;

        match open(file) {
            Ok(mut source) => {
                process_workbook(file, &mut source, &registry, options.on_error, &mut report)?
            }
            Err(error) => record_failure(&mut report, options.on_error, file, None, error)?,
        }
    }

    info!(
        files = report.files_scanned,
        sheets_attempted = report.sheets_attempted,
        sheets_completed = report.sheets_completed,
        "run finished"
    );
    Ok(report)
}

/// Extracts every included sheet of one workbook into `report`.
#[instrument(level = "info", skip_all, fields(file = %file.display()))]
pub fn process_workbook<S: WorkbookSource>(
    file: &Path,
    source: &mut S,
    registry: &ConverterRegistry,
    on_error: ErrorPolicy,
    report: &mut RunReport,
) -> Result<()> {
    for name in source.sheet_names() {
        if name.starts_with(IGNORE_MARKER) {
            debug!(sheet = %name, "sheet ignored by marker");
            report.sheets_ignored += 1;
            continue;
        }

        let sheet = match source.read_sheet(&name) {
            Ok(sheet) => sheet,
            Err(error) => {
                report.sheets_attempted += 1;
                record_failure(report, on_error, file, Some(&name), error)?;
                continue;
            }
        };
        if sheet.rows.is_empty() {
            warn!(sheet = %name, "blank sheet skipped");
            report.sheets_ignored += 1;
            continue;
        }

        report.sheets_attempted += 1;
        match extract_sheet(&sheet, registry) {
            Ok(mut result) => {
                result.file = file.to_path_buf();
                info!(
                    sheet = %name,
                    client_records = result.client_records.len(),
                    server_records = result.server_records.len(),
                    "sheet converted"
                );
                report.sheets_completed += 1;
                report.results.push(result);
            }
            Err(error) => record_failure(report, on_error, file, Some(&name), error)?,
        }
    }
    Ok(())
}

fn record_failure(
    report: &mut RunReport,
    on_error: ErrorPolicy,
    file: &Path,
    sheet: Option<&str>,
    error: ToolError,
) -> Result<()> {
    match on_error {
        ErrorPolicy::Abort => Err(error.in_file(file)),
        ErrorPolicy::SkipSheet => {
            warn!(file = %file.display(), sheet = ?sheet, %error, "skipping after failure");
            report.failures.push(SheetFailure {
                file: file.to_path_buf(),
                sheet: sheet.map(str::to_string),
                message: error.to_string(),
            });
            Ok(())
        }
    }
}

/// Writes every sheet result of `report`. A sheet name seen in an earlier
/// workbook overwrites that workbook's files.
pub fn export_report(
    report: &RunReport,
    format: ExportFormat,
    client_dir: &Path,
    server_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut written = Vec::new();
    for result in &report.results {
        if !seen.insert(result.sheet_name.clone()) {
            warn!(
                sheet = %result.sheet_name,
                file = %result.file.display(),
                "sheet name already exported, overwriting"
            );
        }
        written.extend(export_sheet(result, format, client_dir, server_dir)?);
    }
    Ok(written)
}

/// Runs the configured extraction and, when `write` is set, exports the
/// results. Nothing is written if the run aborts.
#[instrument(level = "info", skip_all, fields(input = %config.config.input.display()))]
pub fn run_config(config: &RunConfig, write: bool) -> Result<RunReport> {
    let report = run_directory(&config.config.input, &config.run_options())?;
    if write {
        let written = export_report(
            &report,
            config.config.format,
            &config.output.client,
            &config.output.server,
        )?;
        info!(files = written.len(), format = %config.config.format, "export finished");
    }
    Ok(report)
}
