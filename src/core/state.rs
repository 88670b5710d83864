//! Mutable state bag shared by every step of a run

use crate::core::timespan::Timespan;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const CYCLE_DELAY: &str = "cycleDelay";
const LAST_EVENT_ID: &str = "lastEventId";

/// Key/value state that outlives a single cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    values: HashMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Delay before the next cycle starts
    pub fn cycle_delay(&self) -> Option<Timespan> {
        self.get(CYCLE_DELAY)
            .and_then(|v| v.as_u64())
            .map(Timespan::from_millis)
    }

    pub fn set_cycle_delay(&mut self, delay: Timespan) {
        self.set(CYCLE_DELAY, Value::from(delay.as_millis()));
    }

    /// Latest event id observed at the start of the current cycle
    pub fn last_event_id(&self) -> Option<&Value> {
        self.get(LAST_EVENT_ID)
    }

    pub fn set_last_event_id(&mut self, id: Value) {
        self.set(LAST_EVENT_ID, id);
    }
}
