//! Integration tests driving `LookupClient` against a scripted local
//! HTTP server, mirroring the gateway contract: form-encoded POST bodies,
//! bearer auth, and `status` envelopes.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Header, Response, Server, StatusCode};
use waybill_lookup::{
    AREA_LIST_PATH, LocationDirectory, LookupClient, PINCODE_DETAIL_PATH,
};
use waybill_types::LookupError;

#[derive(Debug, Clone)]
struct SeenRequest {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

struct TestGateway {
    base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    handle: thread::JoinHandle<()>,
}

impl TestGateway {
    fn join(self) -> Vec<SeenRequest> {
        self.handle.join().expect("join server");
        self.seen.lock().expect("lock").clone()
    }
}

fn spawn_gateway(mut responses: Vec<(u16, String)>) -> TestGateway {
    let server = Server::http("127.0.0.1:0").expect("server");
    let base_url = format!("http://{}", server.server_addr());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_thread = Arc::clone(&seen);
    let expected = responses.len();

    let handle = thread::spawn(move || {
        for _ in 0..expected {
            let mut req = server.recv().expect("request");

            let mut body = String::new();
            req.as_reader().read_to_string(&mut body).expect("body");
            let authorization = req
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            seen_thread.lock().expect("lock").push(SeenRequest {
                method: req.method().to_string(),
                path: req.url().to_string(),
                authorization,
                body,
            });

            let (status, payload) = responses.remove(0);
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

fn detail_success_body() -> String {
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

#[test]
fn pincode_detail_posts_form_body_with_bearer_token() {
    let gateway = spawn_gateway(vec![(200, detail_success_body())]);
    let client = LookupClient::new(&gateway.base_url);

    let detail = client
        .pincode_detail("t0k3n", "400001")
        .expect("detail lookup");
    assert_eq!(detail.city_name, "Mumbai");
    assert_eq!(detail.state_name, "Maharashtra");
    assert_eq!(detail.area_id, "a1");

    let seen = gateway.join();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, PINCODE_DETAIL_PATH);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer t0k3n"));
    assert_eq!(seen[0].body, "pincode=400001");
}

#[test]
fn pincode_detail_rejected_envelope_carries_gateway_message() {
    let gateway = spawn_gateway(vec![(
        200,
        r#"{"status":"error","message":"No record found"}"#.to_string(),
    )]);
    let client = LookupClient::new(&gateway.base_url);

    let err = client.pincode_detail("t0k3n", "999999").unwrap_err();
    assert_eq!(err, LookupError::Rejected("No record found".to_string()));
    gateway.join();
}

#[test]
fn pincode_detail_http_failure_prefers_body_message() {
    let gateway = spawn_gateway(vec![(
        500,
        r#"{"message":"Server error"}"#.to_string(),
    )]);
    let client = LookupClient::new(&gateway.base_url);

    let err = client.pincode_detail("t0k3n", "400001").unwrap_err();
    assert_eq!(err, LookupError::Rejected("Server error".to_string()));
    gateway.join();
}

#[test]
fn pincode_detail_http_failure_without_message_reports_status() {
    let gateway = spawn_gateway(vec![(502, String::new())]);
    let client = LookupClient::new(&gateway.base_url);

    let err = client.pincode_detail("t0k3n", "400001").unwrap_err();
    assert_eq!(err, LookupError::Http(502));
    gateway.join();
}

#[test]
fn area_list_parses_area_array() {
    let gateway = spawn_gateway(vec![(
        200,
        r#"{"status":"success","Area":[
            {"id":"a1","name":"Andheri","city_id":"c1","pincode":"400001"},
            {"id":"a2","name":"Colaba","city_id":"c1","pincode":"400001"}
        ]}"#
        .to_string(),
    )]);
    let client = LookupClient::new(&gateway.base_url);

    let areas = client.area_list("t0k3n", "400001").expect("area lookup");
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0].id, "a1");
    assert_eq!(areas[1].name, "Colaba");

    let seen = gateway.join();
    assert_eq!(seen[0].path, AREA_LIST_PATH);
    assert_eq!(seen[0].body, "pincode=400001");
}

#[test]
fn area_list_rejection_surfaces_message() {
    let gateway = spawn_gateway(vec![(
        200,
        r#"{"status":"failed","message":"Server error"}"#.to_string(),
    )]);
    let client = LookupClient::new(&gateway.base_url);

    let err = client.area_list("t0k3n", "400001").unwrap_err();
    assert_eq!(err, LookupError::Rejected("Server error".to_string()));
    gateway.join();
}

#[test]
fn unreachable_gateway_is_a_rejected_lookup() {
    // Nothing listens on this port; bind-then-drop guarantees it was free.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        port
    };
    let client = LookupClient::new(&format!("http://127.0.0.1:{port}"));

    let err = client.pincode_detail("t0k3n", "400001").unwrap_err();
    match err {
        LookupError::Rejected(message) => {
            assert!(message.contains("lookup request failed"));
        }
        other => panic!("expected rejected transport error, got {other:?}"),
    }
}
