//! Drives the HTTP registry client against a local stub server.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use stmtid_core::config::API_KEY_HEADER;
use stmtid_core::sync::api::{HttpStatementApi, StatementApi};
use stmtid_core::sync::lookup::{check_ids, LookupOutcome};

const FOUND: &str = "aaaaaaaaaaaaaaaa";
const MISSING: &str = "bbbbbbbbbbbbbbbb";
const BROKEN: &str = "cccccccccccccccc";

/// Serves `requests` connections, answering by the id in the request path,
/// and reports each request line plus its API key header.
fn spawn_stub(requests: usize) -> (String, mpsc::Receiver<(String, Option<String>)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming().take(requests) {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut api_key = None;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case(API_KEY_HEADER) {
                        api_key = Some(value.trim().to_string());
                    }
                }
            }

            let (status, body) = if request_line.contains(FOUND) {
                ("200 OK", r#"{"file":"src/a.ts","line":3,"message":"hello"}"#)
            } else if request_line.contains(BROKEN) {
                ("500 Internal Server Error", "database unavailable")
            } else {
                ("404 Not Found", "")
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            tx.send((request_line.trim_end().to_string(), api_key)).unwrap();
        }
    });

    (base, rx)
}

#[test]
fn test_found_missing_error_partition() {
    let (base, requests) = spawn_stub(3);
    let api = HttpStatementApi::new(base, "test-key").unwrap();
    let ids = vec![FOUND.to_string(), MISSING.to_string(), BROKEN.to_string()];

    let mut outcomes = Vec::new();
    let tally = check_ids(&api, &ids, |id, outcome| {
        outcomes.push((id.to_string(), outcome.clone()))
    });

    assert_eq!(tally.found, vec![FOUND]);
    assert_eq!(tally.missing, vec![MISSING]);
    assert_eq!(tally.error_ids(), vec![BROKEN]);
    assert!(!tally.all_found());

    match &outcomes[0].1 {
        LookupOutcome::Found(Some(remote)) => {
            assert_eq!(remote.file.as_deref(), Some("src/a.ts"));
            assert_eq!(remote.line, Some(3));
            assert_eq!(remote.message.as_deref(), Some("hello"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        outcomes[2].1,
        LookupOutcome::Error("Status 500: database unavailable".to_string())
    );

    let seen: Vec<_> = requests.iter().take(3).collect();
    assert_eq!(seen[0].0, format!("GET /statements/{FOUND} HTTP/1.1"));
    assert!(seen.iter().all(|(_, key)| key.as_deref() == Some("test-key")));
}

#[test]
fn test_unreachable_registry_is_an_error_outcome() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let api = HttpStatementApi::new(format!("http://127.0.0.1:{port}"), "k").unwrap();
    let tally = check_ids(&api, &[FOUND.to_string()], |_, _| {});
    assert_eq!(tally.errors.len(), 1);
    assert!(tally.errors[0].1.starts_with("Fetch failed: "));
    assert_eq!(api.base_url(), format!("http://127.0.0.1:{port}"));
}
