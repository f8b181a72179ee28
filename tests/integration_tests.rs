//! Integration tests for railnav
//!
//! Sessions are driven against a mock backend, and the built binary is run
//! over temporary network files.

use std::io::Write;
use std::process::{Command, Output};
use std::time::Duration;

use railnav::{
    AnimationConfig, AnimatorEvent, AnimatorState, BackendClient, BackendConfig, BackendError, EdgeHandle, Mode,
    Session, Status, SyncOutcome,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXAMPLE: &str = "5 6
0.2 0.3 0.5
0 1 2
1 0 1
2 1 0
0 0 0 0 0
1 2 0 12 0.3
2 3 1 10 0.4
3 4 2 8 0.2
4 5 0 14 0.1
5 1 1 9 0.5
2 4 2 7 0.6";

const SMALL: &str = "2 1\n1 1 1\n0 0 0\n0 0 0\n0 0 0\n0 0\n1 2 0 5 0.1";

const ROUTE_STDOUT: &str = "ISOLATED ZONES (metro)
1. 3 stations: 1 2 3

ISOLATED ZONES (bus)
None

Destination: 4 | Path: 1-[metro]->2 2-[bus]->3 3-[rail]->4
";

#[ctor::ctor]
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ok_body(stdout: &str) -> serde_json::Value {
    serde_json::json!({ "ok": true, "exit_code": 0, "stdout": stdout, "stderr": "", "duration_ms": 3 })
}

async fn mount_run(server: &MockServer, stdout: &str) {
    Mock::given(method("POST"))
        .and(path("/api/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(stdout)))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> BackendConfig {
    BackendConfig::with_endpoint(format!("{}/api/run", server.uri()))
}

#[tokio::test]
async fn test_route_search_highlights_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/run"))
        .and(body_string_contains("\\n1\\n1 1 0 4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(ROUTE_STDOUT)))
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::with_config(config_for(&server));
    let mut session = Session::default();
    let submission = session
        .find_route(EXAMPLE, Some(1), Some(4), None)
        .unwrap()
        .unwrap();

    let outcome = session.sync(&client, &submission).await;
    assert!(matches!(outcome, SyncOutcome::Synced { highlighting: true, route_adopted: true, .. }));
    assert_eq!(session.route_input(), "1-[metro]->2 2-[bus]->3 3-[rail]->4");

    let zones = session.report().zones.as_ref().unwrap();
    assert_eq!(zones["metro"].components[0].stations, vec![1, 2, 3]);
    assert!(zones["bus"].none);

    let mut events = Vec::new();
    let state = session
        .animate(
            &AnimationConfig { interval: Duration::from_millis(1) },
            &CancellationToken::new(),
            |event| events.push(event.clone()),
        )
        .await;

    assert_eq!(state, AnimatorState::Completed);
    let order: Vec<(u32, u32, Mode, Vec<EdgeHandle>)> = events
        .iter()
        .filter_map(|event| match event {
            AnimatorEvent::Highlighted { hop, handles, .. } => Some((hop.u, hop.v, hop.mode, handles.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        order,
        vec![
            (1, 2, Mode::Metro, vec![EdgeHandle(0)]),
            (2, 3, Mode::Bus, vec![EdgeHandle(1)]),
            (3, 4, Mode::Rail, vec![EdgeHandle(2)]),
        ]
    );
    assert!(!events.iter().any(|e| matches!(e, AnimatorEvent::Failed { .. })));
    assert_eq!(session.status(), &Status::HighlightComplete);
    assert_eq!(
        session.layout().highlighted(),
        vec![EdgeHandle(0), EdgeHandle(1), EdgeHandle(2)]
    );
}

#[tokio::test]
async fn test_slow_stale_reply_does_not_overwrite_newer_build() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("\"input\":\"5 6"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body(ROUTE_STDOUT))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("\"input\":\"2 1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("ISOLATED ZONES (all)\nNone\n")))
        .mount(&server)
        .await;

    let client = BackendClient::with_config(config_for(&server));
    let mut session = Session::default();
    let a = session.build(EXAMPLE).unwrap();
    let b = session.build(SMALL).unwrap();

    let (reply_a, reply_b) = tokio::join!(client.run(&a.input), client.run(&b.input));

    assert!(matches!(session.apply(&b, reply_b), SyncOutcome::Synced { route: None, .. }));
    assert_eq!(session.apply(&a, reply_a), SyncOutcome::Stale);

    let zones = session.report().zones.as_ref().unwrap();
    assert!(zones["all"].none);
    assert!(!zones.contains_key("metro"));
    assert_eq!(session.route_input(), "");
    assert_eq!(session.network().map(|n| n.node_count()), Some(2));
    assert_eq!(session.status(), &Status::BackendOk);
}

#[tokio::test]
async fn test_library_sync_and_find_route() {
    let server = MockServer::start().await;
    mount_run(&server, ROUTE_STDOUT).await;
    let config = config_for(&server);

    let report = railnav::sync(EXAMPLE, &config).await.unwrap();
    assert_eq!(report.duration_ms, Some(3));
    assert_eq!(report.zones.len(), 2);

    let hops = railnav::find_route(EXAMPLE, 1, 4, &config).await.unwrap().unwrap();
    assert_eq!(railnav::format_route(&hops), "1-[metro]->2 2-[bus]->3 3-[rail]->4");

    assert!(matches!(
        railnav::find_route(EXAMPLE, 1, 9, &config).await,
        Err(railnav::Error::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_unreachable_target() {
    let server = MockServer::start().await;
    mount_run(&server, "Destination: 4 | Path: unreachable\n").await;

    let route = railnav::find_route(EXAMPLE, 1, 4, &config_for(&server)).await.unwrap();
    assert_eq!(route, None);
}

#[tokio::test]
async fn test_backend_down_degrades_to_status() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = BackendClient::with_config(BackendConfig::with_endpoint(format!(
        "http://127.0.0.1:{port}/api/run"
    )));

    let mut session = Session::default();
    session.set_route_input("1-[metro]->2");
    let submission = session.build(EXAMPLE).unwrap();

    let outcome = session.sync(&client, &submission).await;
    assert!(matches!(outcome, SyncOutcome::Failed(BackendError::Unavailable(_))));
    assert_eq!(session.status(), &Status::Built);
    assert_eq!(session.report().zones, None);
    assert_eq!(session.report().backend_error.as_deref(), Some("backend unavailable"));

    // the diagram stays usable
    assert_eq!(session.start_highlight(), Ok(true));
    assert!(matches!(session.tick(), Some(AnimatorEvent::Highlighted { .. })));
}

#[test]
fn test_load_network_and_highlight_route() {
    let file = network_file(EXAMPLE);
    let network = railnav::load_network(file.path()).unwrap();
    let mut layout = railnav::layout_network(&network, &railnav::LayoutConfig::default());

    let handles = railnav::highlight_route(&mut layout, "3-[rail]->4 2-[bus]->3").unwrap();
    assert_eq!(handles, vec![EdgeHandle(2), EdgeHandle(1)]);
    assert_eq!(layout.highlighted(), vec![EdgeHandle(1), EdgeHandle(2)]);

    match railnav::highlight_route(&mut layout, "1-[metro]->2 1-[rail]->3") {
        Err(railnav::Error::Lookup(railnav::LookupError::EdgeNotInLayout { u: 1, v: 3, mode: Mode::Rail })) => {}
        other => panic!("Expected EdgeNotInLayout, got {other:?}"),
    }
    assert_eq!(layout.highlighted(), vec![EdgeHandle(0)]);

    assert!(matches!(
        railnav::highlight_route(&mut layout, "1-[metro]->2,"),
        Err(railnav::Error::Parse(_))
    ));
}

#[test]
fn test_load_network_errors() {
    assert!(matches!(
        railnav::load_network("/nonexistent/network.txt"),
        Err(railnav::Error::IoError(_))
    ));

    let file = network_file("2 1\n1 1 1");
    assert!(matches!(
        railnav::load_network(file.path()),
        Err(railnav::Error::Parse(railnav::ParseError::InvalidMatrix { row: 0, col: 0 }))
    ));
}

fn network_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(text.as_bytes()).expect("Failed to write network");
    file
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_railnav"))
        .args(args)
        .env_remove("RAILNAV_BACKEND")
        .output()
        .expect("Failed to run railnav")
}

#[test]
fn test_cli_offline_highlight() {
    let file = network_file(EXAMPLE);
    let output = run_cli(&[
        file.path().to_str().unwrap(),
        "--offline",
        "--route",
        "1-[metro]->2 2-[bus]->3",
        "--interval-ms",
        "1",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Stations: 5  Edges: 6"));
    assert!(stdout.contains(" *1-[metro]->2 "));
    assert!(stdout.contains(" *2-[bus]->3 "));
    assert!(stdout.contains("  3-[rail]->4 "));
    assert!(stdout.contains("  metro: no data"));
    assert!(stdout.contains("Status: Highlight complete"));
}

#[test]
fn test_cli_dry_run_prints_backend_input() {
    let file = network_file(EXAMPLE);
    let output = run_cli(&[file.path().to_str().unwrap(), "--dry-run", "--start", "1", "--target", "4"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("5 6\n0.2 0.3 0.5\n0 1 2\n"));
    assert!(stdout.trim_end().ends_with("2 4 2 7 0.6\n1\n1 1 0 4"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[DRY RUN]"));
}

#[test]
fn test_cli_rejects_invalid_network() {
    let file = network_file("5 6\n0.2 0.3");
    let output = run_cli(&[file.path().to_str().unwrap(), "--offline"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Parse error: sensitivity value #3"));
}

#[test]
fn test_cli_missing_edge_fails() {
    let file = network_file(EXAMPLE);
    let output = run_cli(&[
        file.path().to_str().unwrap(),
        "--offline",
        "--route",
        "1-[rail]->2",
        "--interval-ms",
        "1",
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Status: Route not found in graph"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_route_search_json() {
    let server = MockServer::start().await;
    mount_run(&server, ROUTE_STDOUT).await;
    let file = network_file(EXAMPLE);
    let endpoint = format!("{}/api/run", server.uri());

    let output = run_cli(&[
        file.path().to_str().unwrap(),
        "--start",
        "1",
        "--target",
        "4",
        "--endpoint",
        &endpoint,
        "--json",
        "--interval-ms",
        "1",
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "Highlight complete");
    assert_eq!(json["route"], "1-[metro]->2 2-[bus]->3 3-[rail]->4");
    assert_eq!(json["report"]["zones"]["metro"]["components"][0]["size"], 3);
    assert_eq!(json["layout"]["edges"][2]["highlighted"], true);
    assert_eq!(json["layout"]["edges"][3]["highlighted"], false);
}
