#![allow(clippy::unwrap_used)]
// Integration tests for `NmsSession` against a wiremock NMS.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use satnms_core::{CoreError, Faults, Handle, NmsSession, ObjectState, SessionConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const POLL: Duration = Duration::from_millis(50);

async fn setup() -> (MockServer, NmsSession) {
    let server = MockServer::start().await;
    let session = session_for(&server, std::env::temp_dir());
    (server, session)
}

fn session_for(server: &MockServer, snapshot_dir: impl Into<std::path::PathBuf>) -> NmsSession {
    let mut config = SessionConfig::new(Url::parse(&server.uri()).unwrap())
        .with_poll_interval(POLL)
        .with_snapshot_dir(snapshot_dir);
    config.tick_timeout = Duration::from_millis(300);
    NmsSession::new(config).unwrap()
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "error_code": 0, "data": data }))
}

fn nms_error(code: i64, desc: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "error_code": code, "error_desc": desc }))
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

/// Answers every insert by echoing the submitted parameters.
struct EchoInsert;

impl Respond for EchoInsert {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        ok(body["params"].clone())
    }
}

/// Echoes inserts after a delay, so concurrent creates overlap in flight.
struct SlowEchoInsert;

impl Respond for SlowEchoInsert {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        EchoInsert.respond(request).set_delay(Duration::from_millis(100))
    }
}

/// A stateful NMS: objects plus a shared snapshot store. Exports are the
/// object table serialized as JSON.
#[derive(Default)]
struct StatefulNms {
    objects: Mutex<Map<String, Value>>,
    saved: Mutex<Map<String, Value>>,
}

impl Respond for StatefulNms {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path();
        let mut objects = self.objects.lock().unwrap();

        if let Some(handle) = path.strip_prefix("/api/object/get/") {
            return objects
                .get(handle)
                .map_or_else(|| nms_error(3, "no such object"), |o| ok(o.clone()));
        }
        if let Some(handle) = path.strip_prefix("/api/object/write/") {
            let changes: Map<String, Value> = serde_json::from_slice(&request.body).unwrap();
            let Some(Value::Object(stored)) = objects.get_mut(handle) else {
                return nms_error(3, "no such object");
            };
            stored.extend(changes);
            return ok(Value::Null);
        }
        if path.starts_with("/api/object/insert/") {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            let handle = format!("{}:{}", body["new_item"].as_str().unwrap(), body["index"]);
            objects.insert(handle, body["params"].clone());
            return ok(body["params"].clone());
        }

        match path {
            "/api/config/export" => {
                ResponseTemplate::new(200).set_body_bytes(serde_json::to_vec(&*objects).unwrap())
            }
            "/api/config/import" => {
                *objects = serde_json::from_slice(&request.body).unwrap();
                ok(Value::Null)
            }
            "/api/config/save" | "/api/config/load" => {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let name = body["name"].as_str().unwrap().to_owned();
                let mut saved = self.saved.lock().unwrap();
                if path.ends_with("save") {
                    saved.insert(name, Value::Object(objects.clone()));
                    return ok(Value::Null);
                }
                match saved.get(&name) {
                    Some(Value::Object(snapshot)) => {
                        *objects = snapshot.clone();
                        ok(Value::Null)
                    }
                    _ => nms_error(7, "no such snapshot"),
                }
            }
            _ => ResponseTemplate::new(404),
        }
    }
}

/// A shaper object whose `low` must not exceed `high`.
struct ShaperWrites {
    stored: Mutex<Map<String, Value>>,
}

impl Respond for ShaperWrites {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let changes: Map<String, Value> = serde_json::from_slice(&request.body).unwrap();
        let mut stored = self.stored.lock().unwrap();
        let mut candidate = stored.clone();
        candidate.extend(changes);

        let low = candidate["low"].as_u64().unwrap_or(0);
        let high = candidate["high"].as_u64().unwrap_or(u64::MAX);
        if low > high {
            return nms_error(11, "low exceeds high");
        }
        *stored = candidate;
        ok(Value::Null)
    }
}

async fn mount_object(server: &MockServer, handle: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/object/get/{handle}")))
        .respond_with(ok(data))
        .mount(server)
        .await;
}

// ── Create / read / update ──────────────────────────────────────────

#[tokio::test]
async fn test_create_assigns_sequential_handles_and_reads_back() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/object/insert/root"))
        .respond_with(EchoInsert)
        .mount(&server)
        .await;

    let first = session
        .create(None, "network", params(json!({ "name": "lab" })))
        .await
        .unwrap();
    let second = session
        .create(None, "network", params(json!({ "name": "spare" })))
        .await
        .unwrap();

    assert_eq!(first.to_string(), "network:0");
    assert_eq!(second.to_string(), "network:1");
    assert_eq!(session.read(&first, "name"), Some(json!("lab")));
    assert_eq!(session.read(&second, "name"), Some(json!("spare")));
    assert_eq!(session.read(&first, "missing"), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_creates_get_distinct_handles() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/object/insert/root"))
        .respond_with(SlowEchoInsert)
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(
        session.create(None, "network", params(json!({ "name": "a" }))),
        session.create(None, "network", params(json!({ "name": "b" }))),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a, b);
    let mut indexes = [a.index(), b.index()];
    indexes.sort_unstable();
    assert_eq!(indexes, [0, 1]);
    assert_eq!(session.repository().len(), 2);
    assert_eq!(session.read(&a, "name"), Some(json!("a")));
    assert_eq!(session.read(&b, "name"), Some(json!("b")));
}

#[tokio::test]
async fn test_rejected_create_does_not_consume_index() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/object/insert/root"))
        .and(body_json(json!({ "new_item": "network", "index": 0, "params": { "name": "" } })))
        .respond_with(nms_error(11, "name must not be empty"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/object/insert/root"))
        .and(body_json(json!({ "new_item": "network", "index": 0, "params": { "name": "ok" } })))
        .respond_with(ok(json!({ "name": "ok" })))
        .mount(&server)
        .await;

    let err = session
        .create(None, "network", params(json!({ "name": "" })))
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::CreationRejected { ref kind, .. } if kind == "network"),
        "got {err:?}"
    );

    let handle = session
        .create(None, "network", params(json!({ "name": "ok" })))
        .await
        .unwrap();
    assert_eq!(handle.index(), 0);
}

#[tokio::test]
async fn test_update_rejects_low_above_high_and_keeps_old_values() {
    let (server, session) = setup().await;
    let initial = json!({ "low": 10, "high": 20 });
    Mock::given(method("POST"))
        .and(path("/api/object/insert/root"))
        .respond_with(EchoInsert)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/object/write/shaper:0"))
        .respond_with(ShaperWrites {
            stored: Mutex::new(params(initial.clone())),
        })
        .mount(&server)
        .await;

    let shaper = session
        .create(None, "shaper", params(initial))
        .await
        .unwrap();

    let err = session
        .update(&shaper, params(json!({ "low": 30 })))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::UpdateRejected { .. }), "got {err:?}");
    assert_eq!(session.read(&shaper, "low"), Some(json!(10)));

    // Equal bounds are allowed.
    session
        .update(&shaper, params(json!({ "low": 20 })))
        .await
        .unwrap();
    assert_eq!(session.read(&shaper, "low"), Some(json!(20)));
    assert_eq!(session.read(&shaper, "high"), Some(json!(20)));
}

#[tokio::test]
async fn test_update_in_controlled_mode() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/object/write/station:4"))
        .respond_with(nms_error(5, "station is in controlled mode"))
        .mount(&server)
        .await;

    let err = session
        .update(&Handle::new("station", 4), params(json!({ "enable": 1 })))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ControlledMode { ref target, .. } if target == "station:4"));
}

#[tokio::test]
async fn test_fetch_absorbs_live_values() {
    let (server, session) = setup().await;
    let handle = Handle::new("controller", 0);
    mount_object(&server, "controller:0", json!({ "name": "hub", "state": "Up" })).await;

    let name = session.fetch(&handle, "name").await.unwrap();
    assert_eq!(name, Some(json!("hub")));
    assert_eq!(session.read(&handle, "state"), Some(json!("Up")));
}

#[tokio::test]
async fn test_fetch_missing_object() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/object/get/station:9"))
        .respond_with(nms_error(3, "no such object"))
        .mount(&server)
        .await;

    let err = session
        .fetch(&Handle::new("station", 9), "state")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_controller_mode_checked_before_request() {
    let (server, session) = setup().await;

    let err = session
        .create(
            Some(&Handle::new("teleport", 0)),
            "controller",
            params(json!({ "mode": "MF_hub", "model": "UHP-100" })),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::InvalidUsage { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Convergence ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_wait_up_returns_once_state_is_up() {
    let (server, session) = setup().await;
    let handle = Handle::new("station", 0);
    Mock::given(method("GET"))
        .and(path("/api/object/get/station:0"))
        .respond_with(ok(json!({ "state": "Down" })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_object(&server, "station:0", json!({ "state": 0 })).await;

    let outcome = session
        .poll_state(&handle, Duration::from_secs(10), |s| s == Some(ObjectState::Up))
        .await;

    assert!(outcome.is_reached());
    assert_eq!(outcome.polls(), 3);
    assert!(outcome.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_wait_up_times_out_within_one_interval() {
    let (server, session) = setup().await;
    let handle = Handle::new("station", 1);
    mount_object(&server, "station:1", json!({ "state": "Fault" })).await;

    let timeout = Duration::from_millis(300);
    let started = Instant::now();
    let reached = session.wait_up(&handle, timeout).await;
    let elapsed = started.elapsed();

    assert!(!reached);
    assert!(elapsed >= timeout);
    // Scheduling slack on top of the timeout + interval bound.
    assert!(elapsed < timeout + POLL + Duration::from_millis(250), "{elapsed:?}");
}

#[tokio::test]
async fn test_unreadable_object_never_converges() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/object/get/station:2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let reached = session
        .wait_up(&Handle::new("station", 2), Duration::from_millis(200))
        .await;
    assert!(!reached);
}

#[tokio::test]
async fn test_wait_not_state_accepts_missing_state() {
    let (server, session) = setup().await;
    mount_object(&server, "station:3", json!({ "name": "remote" })).await;

    let reached = session
        .wait_not_state(&Handle::new("station", 3), ObjectState::Down, Duration::from_secs(5))
        .await;
    assert!(reached);
}

#[tokio::test]
async fn test_wait_faults_strict_and_subset() {
    let (server, session) = setup().await;
    let handle = Handle::new("station", 5);
    let reported = Faults::RX1 | Faults::DOWN;
    mount_object(&server, "station:5", json!({ "faults": reported.bits() })).await;

    let short = Duration::from_millis(200);
    assert!(session.wait_faults(&handle, Faults::RX1, false, short).await);
    assert!(!session.wait_faults(&handle, Faults::RX1, true, short).await);
    assert!(session.wait_faults(&handle, reported, true, short).await);
    assert_eq!(session.current_faults(&handle).await.unwrap(), Some(reported));
}

#[tokio::test]
async fn test_missing_or_garbled_faults_never_converge() {
    let (server, session) = setup().await;
    mount_object(&server, "station:6", json!({ "state": "Up" })).await;
    mount_object(&server, "station:7", json!({ "state": "Up", "faults": { "rx": true } })).await;

    for index in [6, 7] {
        let handle = Handle::new("station", index);
        assert_eq!(session.current_faults(&handle).await.unwrap(), None);
        assert!(
            !session
                .wait_faults(&handle, Faults::empty(), true, Duration::from_millis(200))
                .await
        );
    }
}

#[tokio::test]
async fn test_wait_ticks_counts_configuration_cycles() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/realtime/tick"))
        .respond_with(ok(json!({ "tick": 10 })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/realtime/tick"))
        .respond_with(ok(json!({ "tick": 11 })))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/realtime/tick"))
        .respond_with(ok(json!({ "tick": 12 })))
        .with_priority(3)
        .mount(&server)
        .await;

    assert!(session.wait_ticks(2).await.unwrap());
    assert!(session.wait_ticks(0).await.unwrap());
}

#[tokio::test]
async fn test_wait_ticks_stalled_counter() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/realtime/tick"))
        .respond_with(ok(json!({ "tick": 5 })))
        .mount(&server)
        .await;

    assert!(!session.wait_ticks(1).await.unwrap());
}

// ── End-to-end topology ─────────────────────────────────────────────

#[tokio::test]
async fn test_star_network_topology_comes_up() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/object/insert/"))
        .respond_with(EchoInsert)
        .mount(&server)
        .await;
    mount_object(&server, "controller:0", json!({ "state": "Up", "faults": 0 })).await;
    mount_object(&server, "station:0", json!({ "state": "Up", "faults": 0 })).await;

    let network = session
        .create(None, "network", params(json!({ "name": "lab" })))
        .await
        .unwrap();
    let teleport = session
        .create(Some(&network), "teleport", params(json!({ "name": "tp1" })))
        .await
        .unwrap();
    let controller = session
        .create(
            Some(&teleport),
            "controller",
            params(json!({ "name": "hub", "mode": "MF_hub", "model": "UHP-200" })),
        )
        .await
        .unwrap();
    let vno = session
        .create(Some(&network), "vno", params(json!({ "name": "vno1" })))
        .await
        .unwrap();
    let station = session
        .create(
            Some(&vno),
            "station",
            params(json!({ "name": "rem1", "mode": "star", "serial": 12345 })),
        )
        .await
        .unwrap();
    for route in ["ip_address", "default_route"] {
        session
            .create(
                Some(&station),
                "station_route",
                params(json!({ "type": route, "ip": "10.10.0.1" })),
            )
            .await
            .unwrap();
    }

    assert!(session.wait_up(&controller, Duration::from_secs(60)).await);
    assert!(session.wait_up(&station, Duration::from_secs(60)).await);

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(
        paths,
        [
            "/api/object/insert/root",
            "/api/object/insert/network:0",
            "/api/object/insert/teleport:0",
            "/api/object/insert/network:0",
            "/api/object/insert/vno:0",
            "/api/object/insert/station:0",
            "/api/object/insert/station:0",
        ]
    );

    let routes = session.repository().children(&station);
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[1].handle.to_string(), "station_route:1");
    assert_eq!(
        session.repository().get(&controller).unwrap().parent,
        Some(teleport)
    );
}

// ── Snapshots ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_local_snapshot_round_trip_resets_repository() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = session_for(&server, dir.path());
    let artifact: Vec<u8> = b"\x00cfg\xffbinary".to_vec();

    Mock::given(method("GET"))
        .and(path("/api/config/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(artifact.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/config/import"))
        .and(wiremock::matchers::body_bytes(artifact.clone()))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/object/insert/root"))
        .respond_with(EchoInsert)
        .mount(&server)
        .await;

    session.create_backup("baseline", true).await.unwrap();
    assert_eq!(
        std::fs::read(dir.path().join("baseline.cfg")).unwrap(),
        artifact
    );

    session
        .create(None, "network", params(json!({ "name": "scratch" })))
        .await
        .unwrap();
    assert_eq!(session.repository().len(), 1);

    session.apply_backup("baseline", true).await.unwrap();
    assert!(session.repository().is_empty());

    let handle = session
        .create(None, "network", params(json!({ "name": "again" })))
        .await
        .unwrap();
    assert_eq!(handle.index(), 0);
}

async fn snapshot_restores_captured_values(local: bool) {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = session_for(&server, dir.path());
    Mock::given(path_regex("^/api/"))
        .respond_with(StatefulNms::default())
        .mount(&server)
        .await;

    let handle = session
        .create(None, "network", params(json!({ "name": "lab", "mtu": 1500 })))
        .await
        .unwrap();
    session.create_backup("baseline", local).await.unwrap();

    let edited = params(json!({ "name": "edited", "mtu": 9000 }));
    session.update(&handle, edited.clone()).await.unwrap();
    session.create_backup("edited", local).await.unwrap();

    session.apply_backup("baseline", local).await.unwrap();
    assert_eq!(
        session.refresh(&handle).await.unwrap(),
        params(json!({ "name": "lab", "mtu": 1500 }))
    );

    session.apply_backup("edited", local).await.unwrap();
    assert_eq!(session.refresh(&handle).await.unwrap(), edited);
}

#[tokio::test]
async fn test_local_snapshot_restores_captured_values() {
    snapshot_restores_captured_values(true).await;
}

#[tokio::test]
async fn test_shared_snapshot_restores_captured_values() {
    snapshot_restores_captured_values(false).await;
}

#[tokio::test]
async fn test_missing_local_snapshot() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = session_for(&server, dir.path());

    let err = session.load_config("nope", true).await.unwrap_err();
    assert!(matches!(err, CoreError::SnapshotNotFound { ref name } if name == "nope"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_shared_snapshot() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/config/load"))
        .respond_with(nms_error(7, "no such snapshot"))
        .mount(&server)
        .await;

    let err = session.load_config("ghost", false).await.unwrap_err();
    assert!(matches!(err, CoreError::SnapshotNotFound { .. }));
}

// ── Connection ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_logs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "nms_session=abc; Path=/")
                .set_body_json(json!({ "error_code": 0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = SessionConfig::new(Url::parse(&server.uri()).unwrap())
        .with_credentials("admin", "secret".to_string().into());
    let session = NmsSession::connect(config).await.unwrap();
    assert!(session.client().has_session_cookie());
}

#[tokio::test]
async fn test_connect_with_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = SessionConfig::new(Url::parse(&server.uri()).unwrap())
        .with_credentials("admin", "wrong".to_string().into());
    let result = NmsSession::connect(config).await;
    assert!(matches!(result, Err(CoreError::AuthenticationFailed { .. })));
}
