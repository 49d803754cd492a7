// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{StatisticsPayload, SurfaceSet, table_id};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Anything that can produce one statistics payload per call.
pub trait StatisticsSource {
    fn fetch_statistics(&self) -> anyhow::Result<StatisticsPayload>;
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("fetch statistics failed: {0:#}")]
    Fetch(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableUpdate {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: Vec<TableUpdate>,
    pub skipped: Vec<String>,
}

impl RefreshReport {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "refreshed {} {}",
            self.updated.len(),
            if self.updated.len() == 1 {
                "table"
            } else {
                "tables"
            }
        );
        if !self.skipped.is_empty() {
            out.push_str(&format!("; no table for {}", self.skipped.join(", ")));
        }
        out
    }
}

/// One refresh cycle: fetch once, then repopulate every matching table.
///
/// A failed fetch leaves every table untouched.
pub fn refresh_all<S, B>(source: &S, board: &mut B) -> Result<RefreshReport, RefreshError>
where
    S: StatisticsSource + ?Sized,
    B: SurfaceSet + ?Sized,
{
    let payload = source.fetch_statistics().map_err(|error| {
        warn!("statistics fetch failed: {error:#}");
        RefreshError::Fetch(error)
    })?;
    Ok(apply_payload(&payload, board))
}

/// Clears and repopulates each table named by a dataset in `payload`.
pub fn apply_payload<B>(payload: &StatisticsPayload, board: &mut B) -> RefreshReport
where
    B: SurfaceSet + ?Sized,
{
    let mut report = RefreshReport::default();
    for (name, dataset) in payload.iter() {
        let id = table_id(name);
        let Some(sink) = board.surface_mut(&id) else {
            warn!(dataset = name, table = %id, "no display table for dataset; skipping");
            report.skipped.push(id);
            continue;
        };

        debug!(table = %id, rows = dataset.data.len(), "updating table");
        sink.set_columns(&dataset.headers);
        sink.clear();
        for row in dataset.rows() {
            sink.add_row(row);
        }
        report.updated.push(TableUpdate {
            table: id,
            rows: dataset.data.len(),
        });
    }

    info!(
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        "refresh cycle applied"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::{RefreshError, RefreshReport, TableUpdate};

    #[test]
    fn summary_mentions_skipped_tables() {
        let report = RefreshReport {
            updated: vec![TableUpdate {
                table: "Github_Issue".to_owned(),
                rows: 3,
            }],
            skipped: vec!["Unknown_Table".to_owned(), "Other".to_owned()],
        };
        assert_eq!(
            report.summary(),
            "refreshed 1 table; no table for Unknown_Table, Other"
        );
    }

    #[test]
    fn summary_pluralizes() {
        assert_eq!(RefreshReport::default().summary(), "refreshed 0 tables");
    }

    #[test]
    fn fetch_error_message_keeps_context_chain() {
        let error = RefreshError::Fetch(
            anyhow::anyhow!("connection refused").context("cannot reach http://127.0.0.1:1"),
        );
        let message = error.to_string();
        assert!(message.contains("cannot reach http://127.0.0.1:1"));
        assert!(message.contains("connection refused"));
    }
}
