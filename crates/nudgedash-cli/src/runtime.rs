// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use nudgedash_app::StatisticsPayload;
use nudgedash_client::Client;
use nudgedash_tui::{DashboardRuntime, InternalEvent, RefreshOutcome};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Fetches on a worker thread per cycle so a slow server never blocks input.
pub struct ClientRuntime {
    client: Arc<Client>,
}

impl ClientRuntime {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

fn fetch_outcome(client: &Client) -> RefreshOutcome {
    match client.fetch_statistics() {
        Ok(payload) => RefreshOutcome::Fetched(payload),
        Err(error) => RefreshOutcome::Failed(format!("{error:#}")),
    }
}

impl DashboardRuntime for ClientRuntime {
    fn fetch_statistics(&mut self) -> Result<StatisticsPayload> {
        self.client.fetch_statistics()
    }

    fn spawn_refresh(&mut self, cycle: u64, tx: Sender<InternalEvent>) -> Result<()> {
        let client = Arc::clone(&self.client);
        thread::Builder::new()
            .name(format!("refresh-{cycle}"))
            .spawn(move || {
                let outcome = fetch_outcome(&client);
                if tx.send(InternalEvent::Refresh { cycle, outcome }).is_err() {
                    debug!(cycle, "dashboard closed before refresh finished");
                }
            })
            .context("spawn refresh worker")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ClientRuntime;
    use anyhow::{Result, anyhow};
    use nudgedash_client::Client;
    use nudgedash_testkit::sample_payload;
    use nudgedash_tui::{DashboardRuntime, InternalEvent, RefreshOutcome};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    #[test]
    fn spawn_refresh_reports_payload_over_channel() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let endpoint = format!("http://{}/statistics", server.server_addr());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let body = serde_json::to_string(&sample_payload().expect("fixture payload"))
                .expect("fixture encodes");
            let response = Response::from_string(body).with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            );
            request.respond(response).expect("response should succeed");
        });

        let mut runtime = ClientRuntime::new(Client::new(&endpoint, Duration::from_secs(1))?);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_refresh(7, tx)?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(
            event,
            InternalEvent::Refresh {
                cycle: 7,
                outcome: RefreshOutcome::Fetched(sample_payload()?),
            }
        );

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn spawn_refresh_reports_unreachable_server_as_failure() -> Result<()> {
        let client = Client::new("http://127.0.0.1:1/statistics", Duration::from_millis(50))?;
        let mut runtime = ClientRuntime::new(client);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_refresh(1, tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::Refresh {
                cycle: 1,
                outcome: RefreshOutcome::Failed(message),
            } => assert!(message.contains("cannot reach")),
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }
}
