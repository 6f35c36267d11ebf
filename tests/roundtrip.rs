use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Format, Workbook};
use serde_json::json;
use sheet_config_tools::config::{Excludes, InputConfig, OutputConfig, RunConfig};
use sheet_config_tools::io::WorkbookSource;
use sheet_config_tools::io::excel_read::open_workbook;
use sheet_config_tools::io::export::ExportFormat;
use sheet_config_tools::model::MergedRange;
use sheet_config_tools::run::run_config;
use tempfile::tempdir;

const HEADER: [[&str; 5]; 4] = [
    ["item id", "name", "group", "position", "#designer memo"],
    ["id", "name", "group", "pos", "memo"],
    ["int", "string", "int", "pair", "string"],
    ["cs", "c", "s", "", "cs"],
];

fn write_item_workbook(path: &Path) {
    let mut workbook = Workbook::new();

    let items = workbook.add_worksheet();
    items.set_name("Item").expect("sheet named");
    for (row, cells) in HEADER.iter().enumerate() {
        for (col, text) in cells.iter().enumerate() {
            items
                .write_string(row as u32, col as u16, *text)
                .expect("header written");
        }
    }
    items.write_number(4, 0, 1).expect("cell written");
    items.write_string(4, 1, "Sword").expect("cell written");
    items
        .merge_range(4, 2, 5, 2, "100", &Format::new())
        .expect("range merged");
    items.write_string(4, 3, "3:4").expect("cell written");
    items.write_string(4, 4, "not exported").expect("cell written");
    items.write_number(5, 0, 2).expect("cell written");
    items.write_string(5, 1, "Shield").expect("cell written");

    let notes = workbook.add_worksheet();
    notes.set_name("#Notes").expect("sheet named");
    notes.write_string(0, 0, "free text").expect("cell written");

    workbook.save(path).expect("workbook saved");
}

#[test]
fn reader_returns_absolute_grid_and_merged_ranges() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("items.xlsx");
    write_item_workbook(&path);

    let mut workbook = open_workbook(&path).expect("workbook opened");
    assert_eq!(workbook.sheet_names(), ["Item", "#Notes"]);

    let sheet = workbook.read_sheet("Item").expect("sheet read");
    assert_eq!(sheet.rows.len(), 6);
    assert_eq!(sheet.rows[1], ["id", "name", "group", "pos", "memo"]);
    assert_eq!(sheet.rows[4], ["1", "Sword", "100", "3:4", "not exported"]);
    assert_eq!(sheet.rows[5], ["2", "Shield", "", "", ""]);
    assert_eq!(sheet.merged, vec![MergedRange::new((4, 2), (5, 2), "100")]);

    assert!(workbook.read_sheet("Missing").is_err());
}

#[test]
fn workbook_directory_exports_client_and_server_json() {
    let dir = tempdir().expect("temporary directory");
    let input = dir.path().join("excel");
    fs::create_dir(&input).expect("input directory");
    write_item_workbook(&input.join("items.xlsx"));
    write_item_workbook(&input.join("draft_items.xlsx"));

    let config = RunConfig {
        config: InputConfig {
            input: input.clone(),
            format: ExportFormat::Json,
            excludes: Excludes::Joined("draft".into()),
        },
        output: OutputConfig {
            client: dir.path().join("out/client"),
            server: dir.path().join("out/server"),
        },
        ..RunConfig::default()
    };

    let report = run_config(&config, true).expect("run completes");
    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.files_excluded, 1);
    assert_eq!(report.sheets_ignored, 1);
    assert_eq!(report.sheets_attempted, 1);
    assert_eq!(report.sheets_completed, 1);

    let read = |path: &Path| -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).expect("output read")).expect("JSON parsed")
    };

    assert_eq!(
        read(&dir.path().join("out/client/Item.json")),
        json!([
            { "id": 1, "name": "Sword", "pos": { "x": 3, "y": 4 } },
            { "id": 2, "name": "Shield" },
        ])
    );
    assert_eq!(
        read(&dir.path().join("out/server/Item.json")),
        json!([
            { "id": 1, "group": 100, "pos": { "x": 3, "y": 4 } },
            { "id": 2, "group": 100 },
        ])
    );
    assert!(!dir.path().join("out/client/#Notes.json").exists());
}

#[test]
fn check_mode_writes_nothing() {
    let dir = tempdir().expect("temporary directory");
    let input = dir.path().join("excel");
    fs::create_dir(&input).expect("input directory");
    write_item_workbook(&input.join("items.xlsx"));

    let config = RunConfig {
        config: InputConfig {
            input,
            ..InputConfig::default()
        },
        output: OutputConfig {
            client: dir.path().join("client"),
            server: dir.path().join("server"),
        },
        ..RunConfig::default()
    };

    let report = run_config(&config, false).expect("run completes");
    assert_eq!(report.results.len(), 1);
    assert!(!dir.path().join("client").exists());
}

#[test]
fn missing_input_directory_is_reported() {
    let dir = tempdir().expect("temporary directory");
    let config = RunConfig {
        config: InputConfig {
            input: dir.path().join("nope"),
            ..InputConfig::default()
        },
        ..RunConfig::default()
    };

    assert!(matches!(
        run_config(&config, false),
        Err(sheet_config_tools::ToolError::MissingInput(_))
    ));
}
