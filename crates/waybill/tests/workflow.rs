//! End-to-end workflow tests: a real `FormSession` over a real
//! `LookupClient`, driven against a scripted local gateway.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tiny_http::{Header, Response, Server, StatusCode};
use waybill::{FieldKey, FormSession, SessionOptions};
use waybill_lookup::{AREA_LIST_PATH, LookupClient, PINCODE_DETAIL_PATH};
use waybill_types::{AddressRole, UserProfile};

struct TestGateway {
    base_url: String,
    seen: Arc<Mutex<Vec<(String, Option<String>, String)>>>,
    handle: thread::JoinHandle<()>,
}

impl TestGateway {
    fn join(self) -> Vec<(String, Option<String>, String)> {
        self.handle.join().expect("join server");
        self.seen.lock().expect("lock").clone()
    }
}

fn spawn_gateway(
    routes: BTreeMap<String, (u16, String)>,
    expected_requests: usize,
) -> TestGateway {
    let server = Server::http("127.0.0.1:0").expect("server");
    let base_url = format!("http://{}", server.server_addr());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_thread = Arc::clone(&seen);

    let handle = thread::spawn(move || {
        for _ in 0..expected_requests {
            let mut req = server.recv().expect("request");

            let mut body = String::new();
            req.as_reader().read_to_string(&mut body).expect("body");
            let auth = req
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let path = req.url().to_string();
            seen_thread
                .lock()
                .expect("lock")
                .push((path.clone(), auth, body));

            let (status, payload) = routes
                .get(&path)
                .cloned()
                .unwrap_or((404, "{}".to_string()));
            let resp = Response::from_string(payload)
                .with_status_code(StatusCode(status))
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").expect("header"),
                );
            req.respond(resp).expect("respond");
        }
    });

    TestGateway {
        base_url,
        seen,
        handle,
    }
}

fn detail_body() -> String {
    r#"{
        "status": "success",
        "area_id": "a1",
        "area_name": "Andheri",
        "city_id": "c1",
        "city_name": "Mumbai",
        "state_id": "s1",
        "state_name": "Maharashtra",
        "country_id": "in",
        "country_name": "India"
    }"#
    .to_string()
}

fn area_body() -> String {
    r#"{"status":"success","Area":[{"id":"a1","name":"Andheri","city_id":"c1","pincode":"400001"}]}"#
        .to_string()
}

fn e2e_profile() -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        full_name: "Asha Logistics".to_string(),
        token: Some("e2e-token".to_string()),
        ..Default::default()
    }
}

fn e2e_session(base_url: &str) -> FormSession {
    let client = LookupClient::new(base_url).with_timeout(Duration::from_secs(5));
    FormSession::new(
        Arc::new(client),
        e2e_profile(),
        SessionOptions {
            debounce_window: Duration::from_millis(30),
        },
    )
}

#[test]
fn typing_a_pincode_resolves_location_over_http() {
    let gateway = spawn_gateway(
        BTreeMap::from([
            (PINCODE_DETAIL_PATH.to_string(), (200, detail_body())),
            (AREA_LIST_PATH.to_string(), (200, area_body())),
        ]),
        2,
    );
    let session = e2e_session(&gateway.base_url);
    let role = AddressRole::Sender;

    session.on_pincode_change(role, "400001");
    thread::sleep(Duration::from_millis(600));

    let state = session.selection(role, FieldKey::State).expect("state");
    assert_eq!(state.label, "Maharashtra");
    let city = session.selection(role, FieldKey::City).expect("city");
    assert_eq!(city.label, "Mumbai");
    assert_eq!(session.selection(role, FieldKey::Area), None);
    assert_eq!(session.areas(role).len(), 1);

    let seen = gateway.join();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, PINCODE_DETAIL_PATH);
    assert_eq!(seen[0].1.as_deref(), Some("Bearer e2e-token"));
    assert_eq!(seen[0].2, "pincode=400001");
    assert_eq!(seen[1].0, AREA_LIST_PATH);

    // Registering an ad-hoc area builds on the resolved detail.
    let area = session.add_area(role, "Marol").expect("add area");
    assert_eq!(area.city_id, "c1");
    assert_eq!(session.areas(role).len(), 2);

    // The whole exchange is reconstructable from the exported log.
    let td = tempfile::tempdir().expect("tempdir");
    let log_path = td.path().join("events.jsonl");
    session.export_events(&log_path).expect("export");
    let log = std::fs::read_to_string(&log_path).expect("read log");
    assert!(log.lines().count() >= 4);
    assert!(log.contains("\"type\":\"lookup_succeeded\""));
    assert!(log.contains("\"type\":\"area_added\""));
}

#[test]
fn gateway_rejection_lands_in_the_error_slots() {
    let gateway = spawn_gateway(
        BTreeMap::from([
            (PINCODE_DETAIL_PATH.to_string(), (200, detail_body())),
            (
                AREA_LIST_PATH.to_string(),
                (200, r#"{"status":"error","message":"Server error"}"#.to_string()),
            ),
        ]),
        2,
    );
    let session = e2e_session(&gateway.base_url);
    let role = AddressRole::Receiver;

    session.on_pincode_change(role, "400001");
    thread::sleep(Duration::from_millis(600));

    // Detail resolved; the area failure empties the set and surfaces the
    // gateway's message without rolling the detail back.
    let state = session.selection(role, FieldKey::State).expect("state");
    assert_eq!(state.label, "Maharashtra");
    assert!(session.areas(role).is_empty());
    assert_eq!(session.area_error(role).as_deref(), Some("Server error"));
    assert!(session.detail_error(role).is_none());

    gateway.join();
}

#[test]
fn editing_below_six_digits_never_reaches_the_gateway() {
    // Zero expected requests: the server thread exits immediately, and
    // any request would surface as a transport failure in the error slot.
    let gateway = spawn_gateway(BTreeMap::new(), 0);
    let session = e2e_session(&gateway.base_url);
    let role = AddressRole::Sender;

    session.on_pincode_change(role, "40000");
    thread::sleep(Duration::from_millis(300));

    assert_eq!(session.selection(role, FieldKey::State), None);
    assert!(session.detail_error(role).is_none());
    assert!(session.area_error(role).is_none());

    gateway.join();
}
