use super::types::{ApiTransport, FetchError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// 内存中的假服务端：按路径返回固定 JSON，并记录请求顺序
#[derive(Default)]
pub struct FakeApi {
    responses: HashMap<String, Value>,
    delays: HashMap<String, Duration>,
    requested: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, body: Value) -> Self {
        self.responses.insert(path.to_string(), body);
        self
    }

    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requested().iter().filter(|p| p.as_str() == path).count()
    }
}

#[async_trait]
impl ApiTransport for FakeApi {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());

        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }

        self.responses
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::Missing {
                path: path.to_string(),
            })
    }
}
