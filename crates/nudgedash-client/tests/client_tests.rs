// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use nudgedash_app::{CellValue, StatisticsSource, refresh_all};
use nudgedash_client::Client;
use nudgedash_testkit::{default_board, sample_payload_value};
use serde_json::json;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: String, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_endpoint_names_server() {
    let client = Client::new(
        "http://127.0.0.1:1/statistics",
        Duration::from_millis(50),
    )
    .expect("client should initialize");

    let error = client
        .fetch_statistics()
        .expect_err("fetch should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("cannot reach http://127.0.0.1:1/statistics"));
    assert!(message.contains("nudgebot server"));
}

#[test]
fn fetch_decodes_statistics_from_mock_server() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let endpoint = format!("http://{}/statistics", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/statistics");
        assert_eq!(request.method(), &tiny_http::Method::Get);
        let body = json!({
            "Table A": {"headers": ["x", "y"], "data": [{"x": 1, "y": 2}]}
        })
        .to_string();
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&endpoint, Duration::from_secs(1))?;
    let payload = client.fetch_statistics()?;
    let dataset = payload.get("Table A").expect("dataset present");
    assert_eq!(
        dataset.rows().collect::<Vec<_>>(),
        vec![vec![CellValue(json!(1)), CellValue(json!(2))]]
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_error_status_is_reported() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let endpoint = format!("http://{}/statistics", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(
                r#"{"error":"statistics not collected yet"}"#.to_owned(),
                503,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&endpoint, Duration::from_secs(1))?;
    let error = client
        .fetch_statistics()
        .expect_err("503 should surface as error");
    assert_eq!(
        error.to_string(),
        "server error (503): statistics not collected yet"
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_body_is_a_decode_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let endpoint = format!("http://{}/statistics", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response("[1, 2, 3]".to_owned(), 200))
            .expect("response should succeed");
    });

    let client = Client::new(&endpoint, Duration::from_secs(1))?;
    let error = client
        .fetch_statistics()
        .expect_err("array body is not a payload");
    assert!(error.to_string().contains("decode statistics payload"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn client_drives_a_full_refresh_cycle() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let endpoint = format!("http://{}/statistics", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(sample_payload_value().to_string(), 200))
            .expect("response should succeed");
    });

    let client = Client::new(&endpoint, Duration::from_secs(1))?;
    let source: &dyn StatisticsSource = &client;
    let mut board = default_board()?;
    let report = refresh_all(source, &mut board)?;

    assert_eq!(report.updated.len(), 3);
    assert!(report.skipped.is_empty());
    assert_eq!(
        board.get("Github_Repository").map(|table| table.rows.len()),
        Some(1)
    );

    handle.join().expect("server thread should join");
    Ok(())
}
