use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SCHEMA: &str = r#"{
  "columns": [
    {"key": "invoice", "label": "Invoice", "dataType": "text", "required": true, "order": 0},
    {"key": "amount", "label": "Amount", "dataType": "currency", "order": 1},
    {"key": "fees", "label": "Fees", "dataType": "number", "order": 2}
  ],
  "identifierKeys": ["invoice"]
}"#;

const ROWS: &str = "Invoice,Amount,Fees\nA-1,\"$1,000.00\",50\nA-2,400,10\n";

const REPORT: &str = r#"{
  "columns": [
    {"key": "invoice", "label": "Invoice", "type": "source", "sourceColumnKey": "invoice"},
    {"key": "net", "label": "Net", "type": "formula", "expression": "amount - fees", "order": 1}
  ],
  "formulaRows": [{"label": "Total", "functions": {"net": "SUM"}}]
}"#;

fn ledgerdesk(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ledgerdesk").unwrap();
    cmd.env("LEDGERDESK_DATA_DIR", home).env_remove("LEDGERDESK_LOG");
    cmd
}

fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("schema.json"), SCHEMA).unwrap();
    fs::write(temp.path().join("rows.csv"), ROWS).unwrap();
    fs::write(temp.path().join("report.json"), REPORT).unwrap();

    ledgerdesk(temp.path()).arg("init").assert().success();
    ledgerdesk(temp.path())
        .args(["db", "create", "Invoices", "--schema"])
        .arg(temp.path().join("schema.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Created database: Invoices"));
    temp
}

#[test]
fn init_and_config() {
    let temp = TempDir::new().unwrap();
    ledgerdesk(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));

    assert!(temp.path().join("config.json").exists());
    assert!(temp.path().join("data").join("databases.json").exists());

    ledgerdesk(temp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Max rows per database: 10000"));
}

#[test]
fn import_then_reimport_skips_duplicates() {
    let temp = setup();
    let rows = temp.path().join("rows.csv");

    ledgerdesk(temp.path())
        .args(["db", "import", "Invoices"])
        .arg(&rows)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added:        2"));

    ledgerdesk(temp.path())
        .args(["db", "import", "invoices"])
        .arg(&rows)
        .assert()
        .success()
        .stdout(predicate::str::contains("Already stored:       2"))
        .stdout(predicate::str::contains("Added:        0"));

    ledgerdesk(temp.path())
        .args(["db", "show", "Invoices"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows:           2"))
        .stdout(predicate::str::contains("A-2"));
}

#[test]
fn invalid_batch_is_rejected_whole() {
    let temp = setup();
    let bad = temp.path().join("bad.csv");
    fs::write(&bad, "Invoice,Amount\nA-9,5\n,7\n").unwrap();

    ledgerdesk(temp.path())
        .args(["db", "import", "Invoices"])
        .arg(&bad)
        .assert()
        .failure()
        .stdout(predicate::str::contains("'Invoice' is required"))
        .stderr(predicate::str::contains("nothing was imported"));

    ledgerdesk(temp.path())
        .args(["db", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoices"));

    ledgerdesk(temp.path())
        .args(["db", "show", "Invoices"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rows (total 0)."));
}

#[test]
fn dry_run_writes_nothing() {
    let temp = setup();
    ledgerdesk(temp.path())
        .args(["db", "import", "Invoices", "--dry-run"])
        .arg(temp.path().join("rows.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("New rows:             2"))
        .stdout(predicate::str::contains("Dry run"));

    ledgerdesk(temp.path())
        .args(["db", "show", "Invoices"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows:           0"));
}

#[test]
fn report_render_and_export() {
    let temp = setup();
    ledgerdesk(temp.path())
        .args(["db", "import", "Invoices"])
        .arg(temp.path().join("rows.csv"))
        .assert()
        .success();

    ledgerdesk(temp.path())
        .args(["report", "create", "Net revenue", "--database", "Invoices", "--definition"])
        .arg(temp.path().join("report.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Created report: Net revenue"));

    ledgerdesk(temp.path())
        .args(["report", "show", "Net revenue"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total"))
        .stdout(predicate::str::contains("1340"));

    ledgerdesk(temp.path())
        .args(["report", "export", "Net revenue", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rowCount\": 2"))
        .stdout(predicate::str::contains("1340.0"));

    let out = temp.path().join("net.csv");
    ledgerdesk(temp.path())
        .args(["report", "export", "Net revenue", "-o"])
        .arg(&out)
        .assert()
        .success();
    let csv = fs::read_to_string(out).unwrap();
    assert!(csv.starts_with("Summary,Invoice,Net"));
    assert!(csv.contains("Total,,1340"));
}

#[test]
fn report_with_unknown_column_is_rejected() {
    let temp = setup();
    let bad = temp.path().join("bad_report.json");
    fs::write(
        &bad,
        r#"{"columns": [{"key": "x", "label": "X", "type": "formula", "expression": "amount * tax"}]}"#,
    )
    .unwrap();

    ledgerdesk(temp.path())
        .args(["report", "create", "Broken", "--database", "Invoices", "--definition"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tax"));
}

#[test]
fn delete_rows_and_history() {
    let temp = setup();
    ledgerdesk(temp.path())
        .args(["db", "import", "Invoices"])
        .arg(temp.path().join("rows.csv"))
        .assert()
        .success();

    ledgerdesk(temp.path())
        .args(["db", "delete-rows", "Invoices", "--value", "A-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 row(s)"));

    ledgerdesk(temp.path())
        .args(["history", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IMPORT"))
        .stdout(predicate::str::contains("UPDATE"));

    ledgerdesk(temp.path())
        .args(["db", "delete", "Invoices"])
        .assert()
        .success();

    ledgerdesk(temp.path())
        .args(["db", "show", "Invoices"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database not found"));
}

#[test]
fn delete_rows_with_comma_in_identifier() {
    let temp = setup();
    let rows = temp.path().join("acme.csv");
    fs::write(&rows, "Invoice,Amount,Fees\n\"ACME, Inc\",10,1\nACME,5,0\nInc,7,0\n").unwrap();

    ledgerdesk(temp.path())
        .args(["db", "import", "Invoices"])
        .arg(&rows)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added:        3"));

    ledgerdesk(temp.path())
        .args(["db", "delete-rows", "Invoices", "--value", "ACME, Inc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 row(s)"));

    ledgerdesk(temp.path())
        .args(["db", "delete-rows", "Invoices", "--value", "ACME, Inc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 0 row(s)"));

    let keys = temp.path().join("keys.json");
    fs::write(&keys, r#"[["ACME"], ["Inc"]]"#).unwrap();
    ledgerdesk(temp.path())
        .args(["db", "delete-rows", "Invoices", "--keys-file"])
        .arg(&keys)
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 2 row(s)"));

    ledgerdesk(temp.path())
        .args(["db", "delete-rows", "Invoices"])
        .assert()
        .failure();
}
