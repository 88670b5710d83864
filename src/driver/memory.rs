//! In-process scripted resource
//!
//! Used for rehearsing a flow configuration without a live resource
//! (`flowbot run --dry-run`) and as the driver double in tests.

use crate::driver::{DriverError, ResourceDriver};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Page {
    elements: HashSet<String>,
    classes: HashMap<String, HashSet<String>>,
    inputs: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
    script_results: HashMap<String, Value>,
    event_id: i64,
    reward_pending: bool,
    reward_clearing_scripts: HashSet<String>,
    user: Value,
    reload_results: VecDeque<Result<(), DriverError>>,
    evaluate_failures: VecDeque<DriverError>,
    calls: Vec<String>,
    reloads: usize,
}

/// Scripted, in-memory implementation of [`ResourceDriver`]
#[derive(Debug)]
pub struct MemoryDriver {
    page: Mutex<Page>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            page: Mutex::new(Page {
                event_id: 1,
                user: json!({}),
                ..Page::default()
            }),
        }
    }

    fn page(&self) -> MutexGuard<'_, Page> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.page().calls.push(call);
    }

    pub fn add_element(&self, selector: &str) {
        self.page().elements.insert(selector.to_string());
    }

    pub fn remove_element(&self, selector: &str) {
        self.page().elements.remove(selector);
    }

    pub fn add_class(&self, selector: &str, class: &str) {
        let mut page = self.page();
        page.elements.insert(selector.to_string());
        page.classes
            .entry(selector.to_string())
            .or_default()
            .insert(class.to_string());
    }

    pub fn remove_class(&self, selector: &str, class: &str) {
        if let Some(classes) = self.page().classes.get_mut(selector) {
            classes.remove(class);
        }
    }

    pub fn set_image(&self, selector: &str, bytes: Vec<u8>) {
        self.page().images.insert(selector.to_string(), bytes);
    }

    /// Value returned by `evaluate(script)`; unknown scripts return `null`
    pub fn set_script_result(&self, script: &str, value: Value) {
        self.page().script_results.insert(script.to_string(), value);
    }

    pub fn set_event_id(&self, id: i64) {
        self.page().event_id = id;
    }

    /// Simulate a new event arriving
    pub fn bump_event_id(&self) -> i64 {
        let mut page = self.page();
        page.event_id += 1;
        page.event_id
    }

    pub fn set_reward_pending(&self, pending: bool) {
        self.page().reward_pending = pending;
    }

    /// Evaluating `script` clears the pending reward
    pub fn clear_reward_on(&self, script: &str) {
        self.page().reward_clearing_scripts.insert(script.to_string());
    }

    pub fn set_user(&self, user: Value) {
        self.page().user = user;
    }

    /// Queue the outcome of the next `reload()` call
    pub fn push_reload_result(&self, result: Result<(), DriverError>) {
        self.page().reload_results.push_back(result);
    }

    /// Make the next `evaluate()` call fail with `error`
    pub fn push_evaluate_failure(&self, error: DriverError) {
        self.page().evaluate_failures.push_back(error);
    }

    pub fn input_value(&self, selector: &str) -> Option<String> {
        self.page().inputs.get(selector).cloned()
    }

    /// Every operation performed so far, e.g. `"evaluate:trigger()"`
    pub fn calls(&self) -> Vec<String> {
        self.page().calls.clone()
    }

    pub fn reload_count(&self) -> usize {
        self.page().reloads
    }
}

#[async_trait]
impl ResourceDriver for MemoryDriver {
    async fn reload(&self) -> Result<(), DriverError> {
        self.record("reload".to_string());
        let mut page = self.page();
        page.reloads += 1;
        page.reload_results.pop_front().unwrap_or(Ok(()))
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        self.record(format!("evaluate:{}", script));
        let mut page = self.page();
        if let Some(error) = page.evaluate_failures.pop_front() {
            return Err(error);
        }
        if page.reward_clearing_scripts.contains(script) {
            page.reward_pending = false;
        }
        Ok(page.script_results.get(script).cloned().unwrap_or(Value::Null))
    }

    async fn has_element(&self, selector: &str) -> Result<bool, DriverError> {
        Ok(self.page().elements.contains(selector))
    }

    async fn element_has_class(&self, selector: &str, class: &str) -> Result<bool, DriverError> {
        Ok(self
            .page()
            .classes
            .get(selector)
            .is_some_and(|classes| classes.contains(class)))
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.record(format!("fill:{}={}", selector, text));
        self.page().inputs.insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn capture(&self, selector: &str) -> Result<Vec<u8>, DriverError> {
        self.page()
            .images
            .get(selector)
            .cloned()
            .ok_or_else(|| DriverError::Script(format!("No element matches \"{}\"", selector)))
    }

    async fn wait_for_response(&self, url_fragment: &str) -> Result<(), DriverError> {
        self.record(format!("wait:{}", url_fragment));
        Ok(())
    }

    async fn latest_event_id(&self) -> Result<Value, DriverError> {
        Ok(Value::from(self.page().event_id))
    }

    async fn reward_pending(&self) -> Result<bool, DriverError> {
        Ok(self.page().reward_pending)
    }

    async fn user(&self) -> Result<Value, DriverError> {
        Ok(self.page().user.clone())
    }
}
