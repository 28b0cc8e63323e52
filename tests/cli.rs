//! Integration tests for the cbrowse `query` command against a local stub API

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Stub contact API plus a config file pointing at it
struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
    base: String,
}

impl TestEnv {
    fn new() -> Self {
        let base = spawn_stub_server();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let config = format!(
            "endpoint = \"{}/api/contacts/?format=json\"\ncountry = \"United States\"\n",
            base
        );
        fs::write(&config_path, config).unwrap();
        Self {
            _temp_dir: temp_dir,
            config_path,
            base,
        }
    }

    fn with_endpoint(path: &str) -> Self {
        let env = Self::new();
        fs::write(
            &env.config_path,
            format!("endpoint = \"{}{}\"\n", env.base, path),
        )
        .unwrap();
        env
    }

    fn query(&self) -> Command {
        let mut cmd = cbrowse_cmd();
        cmd.arg("--config").arg(&self.config_path).arg("query");
        cmd
    }
}

fn cbrowse_cmd() -> Command {
    Command::cargo_bin("cbrowse").unwrap()
}

fn contact(id: u32, country: &str) -> String {
    format!(
        r#"{{"id": {id}, "phone": "555-{id:04}", "country": {{"id": 1, "name": "{country}"}}}}"#
    )
}

fn page_body(contacts: &[String], next: Option<String>) -> String {
    let next = match next {
        Some(url) => format!("\"{}\"", url),
        None => "null".to_string(),
    };
    format!(
        r#"{{"count": {}, "next": {}, "results": [{}]}}"#,
        contacts.len(),
        next,
        contacts.join(",")
    )
}

/// Serve canned pages on an ephemeral port until the test process exits.
fn spawn_stub_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let base_for_thread = base.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            handle_connection(stream, &base_for_thread);
        }
    });
    base
}

fn handle_connection(mut stream: TcpStream, base: &str) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    // Drain headers
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => {}
            Err(_) => return,
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = route(path, base);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn route(path: &str, base: &str) -> (&'static str, String) {
    if path.starts_with("/broken/") {
        return ("200 OK", r#"{"results": []}"#.to_string());
    }
    if path.starts_with("/missing/") {
        return ("404 Not Found", "{}".to_string());
    }
    if path.contains("search=zzz") {
        return ("200 OK", page_body(&[], None));
    }
    if path.contains("page=2") {
        let contacts = vec![
            contact(4, "United States"),
            contact(5, "United States"),
            contact(6, "Mexico"),
        ];
        return ("200 OK", page_body(&contacts, None));
    }
    let contacts = vec![
        contact(1, "United States"),
        contact(2, "Canada"),
        contact(3, "United States"),
        contact(4, "United States"),
    ];
    let next = format!("{}/api/contacts/?format=json&page=2", base);
    ("200 OK", page_body(&contacts, Some(next)))
}

// =============================================================================
// Query
// =============================================================================

#[test]
fn query_prints_first_page() {
    let env = TestEnv::new();
    env.query()
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Found 4 contact(s)\n"))
        .stdout(predicate::str::contains("1\t555-0001\tUnited States\n"))
        .stdout(predicate::str::contains("2\t555-0002\tCanada\n"))
        .stdout(predicate::str::contains("555-0005").not());
}

#[test]
fn query_follows_next_and_drops_duplicates() {
    let env = TestEnv::new();
    let output = env.query().args(["--pages", "3"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let ids: Vec<&str> = stdout
        .lines()
        .skip(1)
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
    assert!(stdout.starts_with("Found 6 contact(s)"));
}

#[test]
fn query_us_view_restricts_country() {
    let env = TestEnv::new();
    env.query()
        .args(["--view", "us"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Found 3 contact(s)"))
        .stdout(predicate::str::contains("Canada").not());
}

#[test]
fn query_even_keeps_even_positions() {
    let env = TestEnv::new();
    env.query()
        .arg("--even")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Found 2 contact(s)"))
        .stdout(predicate::str::contains("2\t555-0002\tCanada"))
        .stdout(predicate::str::contains("4\t555-0004\tUnited States"));
}

#[test]
fn query_even_then_us() {
    let env = TestEnv::new();
    env.query()
        .args(["--even", "--view", "us"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Found 1 contact(s)"))
        .stdout(predicate::str::contains("4\t555-0004"));
}

#[test]
fn query_search_with_no_matches() {
    let env = TestEnv::new();
    env.query()
        .args(["--search", "zzz", "--pages", "5"])
        .assert()
        .success()
        .stdout(predicate::str::diff("Found 0 contact(s)\n"));
}

#[test]
fn malformed_page_fails() {
    let env = TestEnv::with_endpoint("/broken/");
    env.query()
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed response"));
}

#[test]
fn http_error_status_fails() {
    let env = TestEnv::with_endpoint("/missing/");
    env.query()
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));
}

#[test]
fn zero_pages_is_rejected() {
    let env = TestEnv::new();
    env.query()
        .args(["--pages", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pages must be at least 1"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");
    cbrowse_cmd()
        .arg("--config")
        .arg(&missing)
        .arg("query")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn zero_debounce_is_rejected() {
    let env = TestEnv::new();
    fs::write(&env.config_path, "debounce_ms = 0\n").unwrap();
    env.query()
        .assert()
        .failure()
        .stderr(predicate::str::contains("debounce_ms"));
}

#[test]
fn unknown_config_keys_only_warn() {
    let env = TestEnv::new();
    let mut config = fs::read_to_string(&env.config_path).unwrap();
    config.push_str("colour = \"blue\"\n");
    fs::write(&env.config_path, config).unwrap();
    env.query()
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Found 4 contact(s)"))
        .stderr(predicate::str::contains("colour"));
}
