//! End-to-end tests: raw captured bytes in, replay script out.
//!
//! The proptest cases check properties that must hold for every request,
//! whatever method, host and port the capture carries.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use requests_converter::converter::{Converter, PythonRequestsConverter};
use requests_converter::harness::Harness;
use requests_converter::storage::{FileStorage, ScriptStore};
use requests_converter::stream::{Direction, Stream, StreamChunk, StreamMetadata};
use tempfile::tempdir;

fn metadata(host: &str, port: u16) -> StreamMetadata {
    StreamMetadata {
        stream_id: 42,
        client_host: "192.168.1.20".into(),
        client_port: 51515,
        server_host: host.into(),
        server_port: port,
        protocol: "TCP".into(),
    }
}

/// Converts a stream made of client chunks and returns the script text.
fn script_for(host: &str, port: u16, requests: &[&str]) -> String {
    let chunks = requests
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            StreamChunk::new(
                Direction::ClientToServer,
                raw.as_bytes().to_vec(),
                Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
            )
        })
        .collect();
    let result = PythonRequestsConverter::new().convert(&Stream::new(metadata(host, port), chunks));
    let artifact = result.artifact().unwrap();
    assert_eq!(artifact.direction, Direction::ClientToServer);
    String::from_utf8(artifact.content.clone()).unwrap()
}

/// Request lines of a script, without the preamble.
fn calls(script: &str) -> Vec<&str> {
    script.lines().filter(|l| l.starts_with("r = s.")).collect()
}

#[test]
fn get_on_custom_port_matches_expected_line() {
    let script = script_for("10.0.0.5", 8080, &["GET /status HTTP/1.1\r\n\r\n"]);
    assert_eq!(calls(&script), vec!["r = s.get(f\"http://{IP}:8080/status\")"]);
}

#[test]
fn post_on_ipv6_host_carries_body_bytes() {
    let script = script_for("::1", 80, &["POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nx=1"]);
    let call = calls(&script)[0];
    assert!(call.starts_with("r = s.post(f\"http://[{IP}]/\""));
    assert!(call.ends_with(", data=b'x=1')"));
    assert!(script.contains("# IP = '::1'\n"));
}

#[test]
fn requests_render_in_capture_order() {
    let script = script_for(
        "example.org",
        80,
        &[
            "GET /one HTTP/1.1\r\nHost: example.org\r\n\r\nDELETE /two HTTP/1.1\r\n\r\n",
            "PROPFIND /three HTTP/1.1\r\nDepth: 1\r\n\r\n",
        ],
    );
    assert_eq!(
        calls(&script),
        vec![
            "r = s.get(f\"http://{IP}/one\", headers={'Host': 'example.org'})",
            "r = s.delete(f\"http://{IP}/two\")",
            "r = s.request('PROPFIND', f\"http://{IP}/three\", headers={'Depth': '1'})",
        ]
    );
}

#[test]
fn empty_stream_has_preamble_only() {
    let script = script_for("10.0.0.5", 80, &[]);
    assert!(script.starts_with("#!/usr/bin/env python3\n"));
    assert!(script.contains("import requests\n"));
    assert!(script.contains("# Generated from stream 42\n"));
    assert!(script.ends_with("s = requests.Session()\n\n"));
    assert!(calls(&script).is_empty());
}

#[test]
fn harness_round_trip_through_script_dir() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("scripts")).unwrap();
    let converter = PythonRequestsConverter::new();

    let request = STANDARD.encode(b"PUT /item/7 HTTP/1.1\r\nContent-Length: 2\r\n\r\nok");
    let response = STANDARD.encode(b"HTTP/1.1 204 No Content\r\n\r\n");
    let input = format!(
        "{}\n{}\n{}\n\n",
        r#"{"StreamID":42,"ClientHost":"192.168.1.20","ClientPort":51515,"ServerHost":"10.0.0.5","ServerPort":8000,"Protocol":"TCP"}"#,
        format_args!(
            r#"{{"Direction":"client-to-server","Content":"{}","Time":"2024-05-06T07:08:09Z"}}"#,
            request
        ),
        format_args!(
            r#"{{"Direction":"server-to-client","Content":"{}","Time":"2024-05-06T07:08:10Z"}}"#,
            response
        ),
    );

    let mut out = Vec::new();
    let summary = Harness::new(&converter)
        .with_store(&storage)
        .run(Cursor::new(input), &mut out)
        .unwrap();
    assert_eq!(summary.streams, 1);
    assert_eq!(summary.chunks_written, 1);
    assert_eq!(summary.scripts_saved, 1);

    let text = String::from_utf8(out).unwrap();
    let first_line = text.lines().next().unwrap();
    let record: serde_json::Value = serde_json::from_str(first_line).unwrap();
    assert_eq!(record["Direction"], "client-to-server");
    assert_eq!(record["Time"], "2024-05-06T07:08:09Z");
    assert!(text.ends_with("\n\n{}\n"));

    let emitted = STANDARD.decode(record["Content"].as_str().unwrap()).unwrap();
    let stored = storage.get_script(42).unwrap();
    assert_eq!(emitted, stored.as_bytes());
    assert!(stored.ends_with(
        "r = s.put(f\"http://{IP}:8000/item/7\", headers={'Content-Length': '2'}, data=b'ok')\n"
    ));
}

fn method() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["get", "post", "put", "delete", "head", "patch"])
            .prop_map(|m| m.to_string()),
        "[A-Za-z]{1,12}",
    ]
}

fn host() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z]{1,8}\\.[a-z]{2,3}", "[0-9a-f]{1,4}(:[0-9a-f]{1,4}){1,7}", Just("::1".to_string())]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: shorthand iff the lower-cased method is on the shortlist,
    /// otherwise the generic form keeps the captured spelling.
    #[test]
    fn call_form_follows_method(method in method(), path in "/[a-z0-9]{0,12}") {
        let raw = format!("{} {} HTTP/1.1\r\n\r\n", method, path);
        let script = script_for("10.0.0.5", 80, &[raw.as_str()]);
        let lines = calls(&script);
        prop_assert_eq!(lines.len(), 1);

        let lower = method.to_lowercase();
        let url = format!("f\"http://{{IP}}{}\")", path);
        if ["get", "post", "put", "delete", "head", "patch"].contains(&lower.as_str()) {
            prop_assert_eq!(lines[0].to_string(), format!("r = s.{}({}", lower, url));
        } else {
            prop_assert_eq!(lines[0].to_string(), format!("r = s.request('{}', {}", method, url));
        }
    }

    /// Property: brackets iff the host has a colon, port suffix iff the
    /// port is not 80.
    #[test]
    fn host_segment_follows_metadata(host in host(), port in 1u16..=65535) {
        let script = script_for(&host, port, &["GET /x HTTP/1.1\r\n\r\n"]);
        let base = if host.contains(':') { "[{IP}]" } else { "{IP}" };
        let expected = if port == 80 {
            format!("r = s.get(f\"http://{}/x\")", base)
        } else {
            format!("r = s.get(f\"http://{}:{}/x\")", base, port)
        };
        prop_assert_eq!(calls(&script), vec![expected.as_str()]);
    }

    /// Property: exactly one artifact per stream, after every kept chunk,
    /// whatever the server answered.
    #[test]
    fn one_artifact_per_stream(reply in prop::collection::vec(any::<u8>(), 0..64)) {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let stream = Stream::new(
            metadata("10.0.0.5", 80),
            vec![
                StreamChunk::new(Direction::ClientToServer, b"GET / HTTP/1.1\r\n\r\n".to_vec(), t0),
                StreamChunk::new(Direction::ServerToClient, reply, Utc.timestamp_opt(1_001, 0).unwrap()),
            ],
        );
        let result = PythonRequestsConverter::new().convert(&stream);
        let scripts = result
            .chunks
            .iter()
            .filter(|c| c.content.starts_with(b"#!/usr/bin/env python3\n"))
            .count();
        prop_assert_eq!(scripts, 1);
        let artifact = result.artifact().unwrap();
        prop_assert!(artifact.content.starts_with(b"#!/usr/bin/env python3\n"));
        prop_assert_eq!(artifact.time, t0);
    }
}
