//! Parameterized graph statements, the operations the people service batches.
//!
//! Statement text is opaque to this crate. An executor that can return data
//! does so through a statement's [`ResultSlot`], which the submitter keeps a
//! handle to and reads once its submission has completed.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    text: String,
    parameters: Map<String, Value>,
    include_stats: bool,
    #[serde(skip)]
    result: Option<ResultSlot>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Map::new(),
            include_stats: false,
            result: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Ask the executor for result rows
    pub fn returning_rows(mut self) -> (Self, ResultSlot) {
        let slot = ResultSlot::default();
        self.result = Some(slot.clone());
        (self, slot)
    }

    /// Ask the executor for result rows plus update statistics
    pub fn including_stats(mut self) -> (Self, ResultSlot) {
        self.include_stats = true;
        self.returning_rows()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn include_stats(&self) -> bool {
        self.include_stats
    }

    /// Where the executor should deliver this statement's output, if anywhere
    pub fn result_slot(&self) -> Option<&ResultSlot> {
        self.result.as_ref()
    }
}

/// Update statistics for a write statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStats {
    pub contains_updates: bool,
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_deleted: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
    pub properties_set: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementOutput {
    pub rows: Vec<Value>,
    pub stats: Option<UpdateStats>,
}

/// Shared cell an executor fills with one statement's output
#[derive(Debug, Clone, Default)]
pub struct ResultSlot(Arc<Mutex<Option<StatementOutput>>>);

impl ResultSlot {
    pub fn fill(&self, output: StatementOutput) {
        *self.0.lock() = Some(output);
    }

    /// Remove the output; `None` if the executor never filled it
    pub fn take(&self) -> Option<StatementOutput> {
        self.0.lock().take()
    }

    /// Remove the rows and decode each into `T`. An unfilled slot has no rows.
    pub fn take_rows<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        self.take()
            .map(|output| output.rows)
            .unwrap_or_default()
            .into_iter()
            .map(serde_json::from_value)
            .collect()
    }
}
