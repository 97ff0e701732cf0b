//! E2E tests for the iam-actions CLI

#![allow(deprecated)] // cargo_bin deprecation - will update when assert_cmd stabilizes replacement

use assert_cmd::assert::{Assert, OutputAssertExt};
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX: &str = r##"
    <html><body>
    <h1>Actions, resources, and condition keys for AWS services</h1>
    <div class="highlights"><ul>
      <li><a href="./list_widgetsvc.html">Widget Service</a></li>
      <li><a href="./list_gadgets.html">Gadgets</a></li>
      <li><a href="./list_missing.html">Missing</a></li>
    </ul></div>
    </body></html>
"##;

const WIDGET_PAGE: &str = r##"
    <html><body>
    <h1 class="topictitle">Actions, resources, and condition keys for Widget Service</h1>
    <p>Widget Service (service prefix: <code class="code">widgetsvc</code>) provides the following.</p>
    <div class="table-container"><table>
      <tr><th>Actions</th><th>Description</th><th>Access level</th>
          <th>Resource types</th><th>Condition keys</th><th>Dependent actions</th></tr>
      <tr>
        <td rowspan="2"><a id="widgetsvc-CreateWidget"></a><a href="API_CreateWidget.html">CreateWidget</a></td>
        <td rowspan="2">Creates a widget</td>
        <td rowspan="2">Write</td>
        <td><a href="#widgetsvc-widget">widget*</a></td>
        <td></td>
        <td></td>
      </tr>
      <tr>
        <td></td>
        <td><a href="#condition-keys-region">aws:RequestedRegion</a></td>
        <td></td>
      </tr>
    </table></div>
    </body></html>
"##;

const GADGET_PAGE: &str = r##"
    <html><body>
    <h1 class="topictitle">Actions, resources, and condition keys for Gadgets</h1>
    <table id="w42aab7"><tr><th>Actions</th></tr>
      <tr><td><a href="API_ListGadgets.html">ListGadgets</a></td><td>Lists gadgets</td>
          <td>List</td><td></td><td></td><td></td></tr>
    </table>
    </body></html>
"##;

fn iam_actions() -> Command {
    Command::cargo_bin("iam-actions").unwrap()
}

async fn mock_docs() -> MockServer {
    let server = MockServer::start().await;
    for (page, status, body) in [
        ("/reference/reference_policies_actions-resources-contextkeys.html", 200u16, INDEX),
        ("/reference/list_widgetsvc.html", 200, WIDGET_PAGE),
        ("/reference/list_gadgets.html", 200, GADGET_PAGE),
        ("/reference/list_missing.html", 404, ""),
    ] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
    }
    server
}

/// Run the binary against the mock server from `dir`
async fn run_in(dir: &Path, base_url: String, args: &[&str]) -> Assert {
    let dir = dir.to_path_buf();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        iam_actions()
            .current_dir(dir)
            .env("IAM_DOCS_BASE_URL", base_url)
            .env("RUST_LOG", "info")
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
    .assert()
}

#[test]
fn test_help() {
    iam_actions()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--test"))
        .stdout(predicate::str::contains("--workers"));
}

#[test]
fn test_version() {
    iam_actions()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("iam-actions"));
}

#[test]
fn test_workers_validation() {
    iam_actions().args(["--workers", "0"]).assert().failure();
    iam_actions().args(["--workers", "many"]).assert().failure();
}

#[test]
fn test_limit_validation() {
    iam_actions()
        .args(["--test", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--test"));
    iam_actions().args(["--test", "-1"]).assert().failure();
}

#[test]
fn test_rejects_unknown_flag() {
    iam_actions().arg("--crawl").assert().failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scrape_writes_sorted_catalog() {
    let server = mock_docs().await;
    let dir = tempdir().unwrap();

    run_in(
        dir.path(),
        format!("{}/reference/", server.uri()),
        &["--workers", "2"],
    )
    .await
    .success()
    .stdout(predicate::str::contains("\"services\":2"))
    .stdout(predicate::str::contains("\"actions\":2"))
    .stdout(predicate::str::contains("\"prefixes\":1"))
    .stderr(predicate::str::contains("no valid actions found"));

    let output = dir.path().join("snippets").join("iam-actions.json");
    let content = fs::read_to_string(&output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();

    let widgets = &json["widgetsvc"];
    assert_eq!(widgets["serviceName"], "Widget Service");
    assert_eq!(widgets["service_prefix"], "widgetsvc");
    let create = &widgets["actions"]["CreateWidget"];
    assert_eq!(create["action_name"], "widgetsvc:CreateWidget");
    assert_eq!(create["resource_types"][0]["name"], "widget*");
    assert_eq!(create["condition_keys"][0]["name"], "aws:RequestedRegion");

    // Table found by id; no prefix paragraph means bare names
    let gadgets = &json["gadgets"];
    assert!(gadgets["service_prefix"].is_null());
    assert_eq!(gadgets["actions"]["ListGadgets"]["action_name"], "ListGadgets");

    assert!(json.get("missing").is_none());
    assert!(content.find("\"gadgets\"").unwrap() < content.find("\"widgetsvc\"").unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scrape_custom_output_and_limit() {
    let server = mock_docs().await;
    let dir = tempdir().unwrap();

    run_in(
        dir.path(),
        format!("{}/reference/", server.uri()),
        &["--output", "nested/dir/few.json", "--test", "1"],
    )
    .await
    .success();

    let output = dir.path().join("snippets").join("few.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["widgetsvc"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scrape_is_idempotent() {
    let server = mock_docs().await;
    let dir = tempdir().unwrap();
    let base = format!("{}/reference/", server.uri());
    let output = dir.path().join("snippets").join("iam-actions.json");

    run_in(dir.path(), base.clone(), &[]).await.success();
    let first = fs::read(&output).unwrap();
    run_in(dir.path(), base, &["--workers", "1"]).await.success();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_write_failure_exits_nonzero() {
    let server = mock_docs().await;
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("snippets"), "in the way").unwrap();

    run_in(dir.path(), format!("{}/reference/", server.uri()), &[])
        .await
        .failure()
        .stderr(predicate::str::contains("Failed to create output directory"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_index_failure_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dir = tempdir().unwrap();

    run_in(dir.path(), format!("{}/reference/", server.uri()), &[])
        .await
        .failure()
        .stderr(predicate::str::contains("Failed to fetch services index"));

    assert!(!dir.path().join("snippets").exists());
}
