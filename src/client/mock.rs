//! Scripted in-memory API used by unit tests.

use super::{ApiRequest, Result, RundeckApi};
use serde_json::Value;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&ApiRequest, usize) -> Result<Value> + Send + Sync>;

/// Answers every request through `handler(request, call_index)` and keeps a log.
pub struct ScriptedApi {
    handler: Handler,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedApi {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest, usize) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }

    /// Query parameter `key` of the `index`th logged request.
    pub fn param(&self, index: usize, key: &str) -> Option<String> {
        self.log.lock().unwrap().get(index).and_then(|r| {
            r.query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }
}

#[async_trait::async_trait]
impl RundeckApi for ScriptedApi {
    async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let index = {
            let mut log = self.log.lock().unwrap();
            log.push(request.clone());
            log.len() - 1
        };
        (self.handler)(&request, index)
    }
}
