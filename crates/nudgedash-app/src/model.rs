// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::nav::LAST_STEP;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Body of `GET /statistics`: dataset name to dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticsPayload {
    datasets: BTreeMap<String, Dataset>,
}

impl StatisticsPayload {
    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.datasets
            .iter()
            .map(|(name, dataset)| (name.as_str(), dataset))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

impl Dataset {
    /// One row per data entry, each projected through `headers`.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.data.iter().map(|entry| project_row(&self.headers, entry))
    }
}

/// A single displayed cell. Missing fields project to `null` and render empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellValue(pub Value);

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Null => Ok(()),
            Value::String(text) => f.write_str(text),
            other => write!(f, "{other}"),
        }
    }
}

pub type Row = Vec<CellValue>;

pub fn project_row(headers: &[String], entry: &Map<String, Value>) -> Row {
    headers
        .iter()
        .map(|key| CellValue(entry.get(key).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Identifier of the display table that receives a dataset.
pub fn table_id(dataset_name: &str) -> String {
    dataset_name.replace(' ', "_")
}

/// The rendering capability the refresher writes into.
pub trait TableSink {
    fn clear(&mut self);
    fn add_row(&mut self, row: Row);
    fn set_columns(&mut self, _columns: &[String]) {}
}

/// A set of display tables addressable by identifier.
pub trait SurfaceSet {
    fn surface_mut(&mut self, id: &str) -> Option<&mut dyn TableSink>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayTable {
    pub id: String,
    pub step: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl DisplayTable {
    pub fn new(id: impl Into<String>, step: usize) -> Self {
        Self {
            id: id.into(),
            step,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn title(&self) -> String {
        self.id.replace('_', " ")
    }
}

impl TableSink for DisplayTable {
    fn clear(&mut self) {
        self.rows.clear();
    }

    fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    fn set_columns(&mut self, columns: &[String]) {
        self.columns = columns.to_vec();
    }
}

/// Every declared display table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableBoard {
    tables: Vec<DisplayTable>,
}

impl TableBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, id: &str, step: usize) -> Result<()> {
        if id.trim().is_empty() {
            bail!("table id must not be empty");
        }
        if id.contains(' ') {
            bail!(
                "table id {id:?} contains spaces; use {:?} to match dataset names",
                table_id(id)
            );
        }
        if step > LAST_STEP {
            bail!("table {id:?} has step {step}; expected 0..={LAST_STEP}");
        }
        if self.get(id).is_some() {
            bail!("table {id:?} is declared more than once");
        }
        self.tables.push(DisplayTable::new(id, step));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&DisplayTable> {
        self.tables.iter().find(|table| table.id == id)
    }

    pub fn tables(&self) -> &[DisplayTable] {
        &self.tables
    }

    pub fn tables_for_step(&self, step: usize) -> impl Iterator<Item = &DisplayTable> {
        self.tables.iter().filter(move |table| table.step == step)
    }
}

impl SurfaceSet for TableBoard {
    fn surface_mut(&mut self, id: &str) -> Option<&mut dyn TableSink> {
        self.tables
            .iter_mut()
            .find(|table| table.id == id)
            .map(|table| table as &mut dyn TableSink)
    }
}
