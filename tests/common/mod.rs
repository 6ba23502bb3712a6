//! Recording in-memory service used by the executor tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use futures::stream::{self, StreamExt};
use ga_reports::client::{MediaSource, MediaStream, ServiceCall};
use ga_reports::error::{ReportError, Result};
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub enum FakeChunk {
    Data(Vec<u8>),
    Fail(String),
}

/// Serves canned JSON per (method, path). Repeated calls walk through the registered
/// responses and keep returning the last one.
#[derive(Default)]
pub struct FakeService {
    responses: HashMap<(Method, String), Vec<Value>>,
    failures: HashMap<(Method, String), u16>,
    media: Mutex<HashMap<String, Vec<FakeChunk>>>,
    served: Mutex<HashMap<(Method, String), usize>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: Method, path: &str, body: Value) -> Self {
        self.responses
            .entry((method, path.to_string()))
            .or_default()
            .push(body);
        self
    }

    pub fn fail(mut self, method: Method, path: &str, status: u16) -> Self {
        self.failures.insert((method, path.to_string()), status);
        self
    }

    pub fn media(self, path: &str, chunks: Vec<FakeChunk>) -> Self {
        self.media
            .lock()
            .unwrap()
            .insert(path.to_string(), chunks);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    fn record(&self, method: &Method, path: &str, params: &[(&str, &str)]) {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.clone(),
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }

    fn failure(&self, method: &Method, path: &str) -> Option<ReportError> {
        self.failures
            .get(&(method.clone(), path.to_string()))
            .map(|status| ReportError::ApiError {
                status: *status,
                message: format!("fake failure for {}", path),
            })
    }
}

impl ServiceCall for FakeService {
    async fn call(&self, method: Method, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.record(&method, path, params);
        if let Some(err) = self.failure(&method, path) {
            return Err(err);
        }

        let key = (method, path.to_string());
        let Some(bodies) = self.responses.get(&key) else {
            return Err(ReportError::ApiError {
                status: 404,
                message: format!("no fake response for {}", path),
            });
        };

        let mut served = self.served.lock().unwrap();
        let count = served.entry(key).or_insert(0);
        let body = bodies[(*count).min(bodies.len() - 1)].clone();
        *count += 1;
        Ok(body)
    }
}

impl MediaSource for FakeService {
    async fn open_media(&self, path: &str, params: &[(&str, &str)]) -> Result<MediaStream> {
        self.record(&Method::GET, path, params);
        if let Some(err) = self.failure(&Method::GET, path) {
            return Err(err);
        }

        let chunks = self
            .media
            .lock()
            .unwrap()
            .remove(path)
            .unwrap_or_default();
        let total = chunks
            .iter()
            .map(|c| match c {
                FakeChunk::Data(d) => d.len() as u64,
                FakeChunk::Fail(_) => 0,
            })
            .sum();

        let items: Vec<Result<Vec<u8>>> = chunks
            .into_iter()
            .map(|c| match c {
                FakeChunk::Data(d) => Ok(d),
                FakeChunk::Fail(message) => Err(ReportError::InvalidResponse(message)),
            })
            .collect();

        Ok(MediaStream {
            total: Some(total),
            chunks: stream::iter(items).boxed(),
        })
    }
}
