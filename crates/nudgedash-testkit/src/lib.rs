// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use nudgedash_app::{Row, StatisticsPayload, StatisticsSource, SurfaceSet, TableBoard, TableSink};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;

pub const DEFAULT_TABLES: [(&str, usize); 3] = [
    ("Github_Repository", 0),
    ("Github_Pull_Request", 1),
    ("Github_Issue", 2),
];

pub fn payload_from_json(raw: &str) -> Result<StatisticsPayload> {
    serde_json::from_str(raw).context("decode fixture payload")
}

pub fn payload_from_value(value: Value) -> Result<StatisticsPayload> {
    serde_json::from_value(value).context("decode fixture payload")
}

/// Shape of what the bot's server reports for a small project.
pub fn sample_payload_value() -> Value {
    json!({
        "Github Repository": {
            "headers": ["repository", "open_issues", "open_pull_requests"],
            "data": [
                {"repository": "nudgebot", "open_issues": 4, "open_pull_requests": 2}
            ]
        },
        "Github Pull Request": {
            "headers": ["number", "title", "owner", "state", "test_results"],
            "data": [
                {
                    "number": 17,
                    "title": "Add reviewers rotation",
                    "owner": "gshefer",
                    "state": "open",
                    "test_results": {"ci": "passed"}
                },
                {
                    "number": 18,
                    "title": "Fix stale nudge",
                    "owner": "octocat",
                    "state": "open"
                }
            ]
        },
        "Github Issue": {
            "headers": ["number", "title", "state"],
            "data": []
        }
    })
}

pub fn sample_payload() -> Result<StatisticsPayload> {
    payload_from_value(sample_payload_value())
}

pub fn default_board() -> Result<TableBoard> {
    board_with(&DEFAULT_TABLES)
}

pub fn board_with(tables: &[(&str, usize)]) -> Result<TableBoard> {
    let mut board = TableBoard::new();
    for (id, step) in tables {
        board.declare(id, *step)?;
    }
    Ok(board)
}

/// Hands out queued results in order; errors once the script runs dry.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<StatisticsPayload, String>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(self, payload: StatisticsPayload) -> Self {
        self.push(Ok(payload));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.push(Err(message.to_owned()));
        self
    }

    pub fn calls(&self) -> usize {
        match self.calls.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn push(&self, entry: Result<StatisticsPayload, String>) {
        match self.script.lock() {
            Ok(mut guard) => guard.push_back(entry),
            Err(poisoned) => poisoned.into_inner().push_back(entry),
        }
    }
}

impl StatisticsSource for ScriptedSource {
    fn fetch_statistics(&self) -> Result<StatisticsPayload> {
        let next = match self.script.lock() {
            Ok(mut guard) => guard.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        match self.calls.lock() {
            Ok(mut guard) => *guard += 1,
            Err(poisoned) => *poisoned.into_inner() += 1,
        }
        match next {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted source exhausted")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkOp {
    Columns(Vec<String>),
    Clear,
    AddRow(Row),
}

/// Records every call made through the `TableSink` capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingTable {
    pub ops: Vec<SinkOp>,
}

impl RecordingTable {
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for op in &self.ops {
            match op {
                SinkOp::Clear => rows.clear(),
                SinkOp::AddRow(row) => rows.push(row.clone()),
                SinkOp::Columns(_) => {}
            }
        }
        rows
    }
}

impl TableSink for RecordingTable {
    fn clear(&mut self) {
        self.ops.push(SinkOp::Clear);
    }

    fn add_row(&mut self, row: Row) {
        self.ops.push(SinkOp::AddRow(row));
    }

    fn set_columns(&mut self, columns: &[String]) {
        self.ops.push(SinkOp::Columns(columns.to_vec()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingBoard {
    tables: Vec<(String, RecordingTable)>,
    lookups: usize,
}

impl RecordingBoard {
    pub fn with_tables(ids: &[&str]) -> Self {
        Self {
            tables: ids
                .iter()
                .map(|id| ((*id).to_owned(), RecordingTable::default()))
                .collect(),
            lookups: 0,
        }
    }

    pub fn table(&self, id: &str) -> Option<&RecordingTable> {
        self.tables
            .iter()
            .find(|(table_id, _)| table_id == id)
            .map(|(_, table)| table)
    }

    pub fn lookups(&self) -> usize {
        self.lookups
    }
}

impl SurfaceSet for RecordingBoard {
    fn surface_mut(&mut self, id: &str) -> Option<&mut dyn TableSink> {
        self.lookups += 1;
        self.tables
            .iter_mut()
            .find(|(table_id, _)| table_id == id)
            .map(|(_, table)| table as &mut dyn TableSink)
    }
}
