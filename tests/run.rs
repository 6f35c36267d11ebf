use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use sheet_config_tools::ToolError;
use sheet_config_tools::config::{Excludes, RunConfig};
use sheet_config_tools::convert::{ConvertOptions, Leniency, ShorthandGroups};
use sheet_config_tools::io::MemoryWorkbook;
use sheet_config_tools::io::export::{ExportFormat, export_sheet, write_records};
use sheet_config_tools::model::{RawSheet, Record, SheetResult, TypedValue};
use sheet_config_tools::run::{
    ErrorPolicy, RunOptions, export_report, is_excluded, run_with, scan_workbooks,
};
use tempfile::tempdir;

fn sheet(name: &str, data: &[&[&str]]) -> RawSheet {
    RawSheet::new(
        name,
        data.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}

fn item_sheet(name: &str, price: &str) -> RawSheet {
    sheet(
        name,
        &[
            &["", ""],
            &["id", "price"],
            &["int", "number"],
            &["", "s"],
            &["1", price],
        ],
    )
}

fn workbooks() -> Vec<(PathBuf, MemoryWorkbook)> {
    vec![
        (
            PathBuf::from("tables/a_items.xlsx"),
            MemoryWorkbook::new(vec![
                item_sheet("Weapon", "10"),
                item_sheet("#Draft", "oops"),
                item_sheet("Armor", "bad"),
                RawSheet::new("Sheet3", Vec::new()),
            ]),
        ),
        (
            PathBuf::from("tables/b_shop.xlsx"),
            MemoryWorkbook::new(vec![item_sheet("Shop", "2.5")]),
        ),
        (
            PathBuf::from("tables/old/c_legacy.xlsx"),
            MemoryWorkbook::new(vec![item_sheet("Legacy", "1")]),
        ),
    ]
}

fn run(options: &RunOptions) -> sheet_config_tools::Result<sheet_config_tools::run::RunReport> {
    let books = workbooks();
    let files: Vec<PathBuf> = books.iter().map(|(path, _)| path.clone()).collect();
    run_with(&files, options, |path: &Path| {
        books
            .iter()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, book)| book.clone())
            .ok_or_else(|| ToolError::MissingInput(path.to_path_buf()))
    })
}

#[test]
fn abort_stops_at_first_failure() {
    let error = run(&RunOptions::default()).expect_err("Armor has a bad number");
    match error {
        ToolError::InFile { file, source } => {
            assert_eq!(file, PathBuf::from("tables/a_items.xlsx"));
            assert!(matches!(*source, ToolError::Conversion { ref sheet, .. } if sheet == "Armor"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn skip_sheet_continues_and_counts() {
    let options = RunOptions {
        excludes: vec!["old/".to_string()],
        on_error: ErrorPolicy::SkipSheet,
        convert: ConvertOptions::default(),
    };
    let report = run(&options).expect("run completes");

    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.files_excluded, 1);
    assert_eq!(report.sheets_ignored, 2);
    assert_eq!(report.sheets_attempted, 3);
    assert_eq!(report.sheets_completed, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].sheet.as_deref(), Some("Armor"));

    let names: Vec<&str> = report
        .results
        .iter()
        .map(|result| result.sheet_name.as_str())
        .collect();
    assert_eq!(names, ["Weapon", "Shop"]);
    assert_eq!(report.results[1].file, PathBuf::from("tables/b_shop.xlsx"));
    assert_eq!(
        serde_json::to_value(&report.results[1].server_records).expect("serialized"),
        json!([{ "id": 1, "price": 2.5 }])
    );
    assert_eq!(
        serde_json::to_value(&report.results[1].client_records).expect("serialized"),
        json!([{ "id": 1 }])
    );
}

#[test]
fn open_failures_are_skipped_under_skip_sheet() {
    let options = RunOptions {
        on_error: ErrorPolicy::SkipSheet,
        ..RunOptions::default()
    };
    let files = vec![PathBuf::from("missing.xlsx")];
    let report = run_with(&files, &options, |path: &Path| {
        Err::<MemoryWorkbook, _>(ToolError::MissingInput(path.to_path_buf()))
    })
    .expect("run completes");

    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.sheets_attempted, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].sheet, None);
}

#[test]
fn exclusion_is_a_substring_match() {
    let excludes = vec!["draft".to_string(), "old/".to_string()];
    assert!(is_excluded(Path::new("excel/draft_items.xlsx"), &excludes));
    assert!(is_excluded(Path::new("excel/old/items.xlsx"), &excludes));
    assert!(!is_excluded(Path::new("excel/items.xlsx"), &excludes));
    assert!(!is_excluded(Path::new("excel/items.xlsx"), &[]));
}

#[test]
fn scan_lists_workbooks_in_name_order() {
    let dir = tempdir().expect("temporary directory");
    for name in ["b.xlsx", "a.XLSX", "c.xls", "~$a.xlsx", "notes.txt"] {
        fs::write(dir.path().join(name), b"").expect("file written");
    }
    fs::create_dir(dir.path().join("nested.xlsx")).expect("directory created");

    let files = scan_workbooks(dir.path()).expect("directory scanned");
    let names: Vec<String> = files
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.XLSX", "b.xlsx", "c.xls"]);
}

fn sample_result() -> SheetResult {
    let mut client = Record::new();
    client.insert("id".into(), TypedValue::Int(1));
    client.insert("name".into(), TypedValue::String("O'Brien".into()));
    client.insert("pos".into(), TypedValue::Pair { x: 1, y: 2 });

    let mut second = Record::new();
    second.insert("id".into(), TypedValue::Int(2));
    second.insert("open".into(), TypedValue::Bool(true));

    SheetResult {
        file: PathBuf::from("items.xlsx"),
        sheet_name: "Item".into(),
        client_records: vec![client, second],
        server_records: Vec::new(),
    }
}

fn render(format: ExportFormat, records: &[Record]) -> String {
    let mut buffer = Vec::new();
    write_records(&mut buffer, format, "Item", records).expect("records written");
    String::from_utf8(buffer).expect("utf-8 output")
}

#[test]
fn csv_uses_the_union_of_fields() {
    let result = sample_result();
    assert_eq!(
        render(ExportFormat::Csv, &result.client_records),
        "id,name,pos,open\n1,O'Brien,\"{\"\"x\"\":1,\"\"y\"\":2}\",\n2,,,true\n"
    );
}

#[test]
fn sql_quotes_strings_and_composites() {
    let result = sample_result();
    assert_eq!(
        render(ExportFormat::Sql, &result.client_records),
        "INSERT INTO `Item` (`id`, `name`, `pos`) VALUES (1, 'O''Brien', '{\"x\":1,\"y\":2}');\n\
         INSERT INTO `Item` (`id`, `open`) VALUES (2, TRUE);\n"
    );
}

#[test]
fn export_writes_only_non_empty_sides() {
    let dir = tempdir().expect("temporary directory");
    let client_dir = dir.path().join("client");
    let server_dir = dir.path().join("server");

    let written = export_sheet(&sample_result(), ExportFormat::Json, &client_dir, &server_dir)
        .expect("sheet exported");

    assert_eq!(written, vec![client_dir.join("Item.json")]);
    assert!(!server_dir.join("Item.json").exists());
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written[0]).expect("file read"))
            .expect("JSON parsed");
    assert_eq!(
        parsed,
        json!([
            { "id": 1, "name": "O'Brien", "pos": { "x": 1, "y": 2 } },
            { "id": 2, "open": true },
        ])
    );
}

#[test]
fn export_report_writes_every_sheet() {
    let dir = tempdir().expect("temporary directory");
    let mut report = sheet_config_tools::run::RunReport::default();
    report.results.push(sample_result());
    let mut other = sample_result();
    other.sheet_name = "Npc/Boss".into();
    other.server_records = other.client_records.clone();
    report.results.push(other);

    let written = export_report(
        &report,
        ExportFormat::Sql,
        &dir.path().join("c"),
        &dir.path().join("s"),
    )
    .expect("report exported");

    assert_eq!(
        written,
        vec![
            dir.path().join("c").join("Item.sql"),
            dir.path().join("c").join("Npc_Boss.sql"),
            dir.path().join("s").join("Npc_Boss.sql"),
        ]
    );
}

#[test]
fn export_format_parses_names() {
    assert_eq!("JSON".parse::<ExportFormat>().expect("json"), ExportFormat::Json);
    assert_eq!("sql".parse::<ExportFormat>().expect("sql"), ExportFormat::Sql);
    assert!(matches!(
        "xml".parse::<ExportFormat>(),
        Err(ToolError::UnsupportedFormat(name)) if name == "xml"
    ));
}

#[test]
fn config_reads_yaml() {
    let config = RunConfig::from_yaml(
        r#"
config:
  input: ./tables
  format: csv
  excludes: "draft, old/ ,"
output:
  client: ./out/client
  server: ./out/server
engine:
  on_error: skip_sheet
  leniency: strict
  shorthand_groups: reject
"#,
    )
    .expect("config parsed");

    assert_eq!(config.config.input, PathBuf::from("./tables"));
    assert_eq!(config.config.format, ExportFormat::Csv);
    assert_eq!(config.output.server, PathBuf::from("./out/server"));

    let options = config.run_options();
    assert_eq!(options.excludes, ["draft", "old/"]);
    assert_eq!(options.on_error, ErrorPolicy::SkipSheet);
    assert_eq!(options.convert.leniency, Leniency::Strict);
    assert_eq!(options.convert.shorthand_groups, ShorthandGroups::Reject);
}

#[test]
fn config_defaults_fill_missing_sections() {
    let config = RunConfig::from_yaml("config:\n  excludes:\n    - draft\n").expect("parsed");
    assert_eq!(config.config.excludes, Excludes::List(vec!["draft".into()]));
    assert_eq!(config.config.format, ExportFormat::Json);
    assert_eq!(config.config.input, PathBuf::from("excel"));
    assert_eq!(config.engine.on_error, ErrorPolicy::Abort);
    assert_eq!(config.engine.leniency, Leniency::Lenient);

    let bare = RunConfig::from_yaml("config:\n  excludes:\n").expect("parsed");
    assert!(bare.config.excludes.patterns().is_empty());
    assert_eq!(RunConfig::from_yaml("").expect("parsed"), RunConfig::default());
}

#[test]
fn config_rejects_unknown_format() {
    assert!(matches!(
        RunConfig::from_yaml("config:\n  format: xml\n"),
        Err(ToolError::Config(_))
    ));
}
