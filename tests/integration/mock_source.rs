//! Mock load source for integration testing.
//!
//! Serves pre-scripted batches of load records, one batch per fetch,
//! all in-memory with no external dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use loadscope::engine::source::LoadSource;
use loadscope::types::LoadRecord;

/// A scripted load source. Once the batches run out it returns nothing.
pub struct MockSource {
    name: String,
    batches: Arc<Mutex<VecDeque<Vec<LoadRecord>>>>,
    fetches: Arc<Mutex<usize>>,
    /// If set, every fetch returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            batches: Arc::new(Mutex::new(VecDeque::new())),
            fetches: Arc::new(Mutex::new(0)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a batch for a later fetch.
    pub fn push_batch(&self, batch: Vec<LoadRecord>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl LoadSource for MockSource {
    async fn fetch_loads(&self) -> Result<Vec<LoadRecord>> {
        *self.fetches.lock().unwrap() += 1;
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A load with the fields the model reads set explicitly.
pub fn load(id: &str, total_rate: f64, rate_per_mile: f64, deadhead_miles: u32) -> LoadRecord {
    LoadRecord {
        id: id.to_string(),
        origin: "Dallas, TX".to_string(),
        destination: "Atlanta, GA".to_string(),
        total_rate,
        rate_per_mile,
        deadhead_miles,
        equipment: "V".to_string(),
        weight: "42k lbs".to_string(),
        length: "53 ft".to_string(),
        company: "Mock Brokerage".to_string(),
        credit_score: Some(95),
        days_to_pay: Some(30),
    }
}

/// A load that clears every default filter clause (net profit ≈ $1515).
pub fn profitable(id: &str) -> LoadRecord {
    load(id, 6000.0, 4.0, 50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batches_served_in_order() {
        let source = MockSource::new("mock");
        source.push_batch(vec![profitable("A")]);
        source.push_batch(vec![profitable("B"), profitable("C")]);

        assert_eq!(source.fetch_loads().await.unwrap().len(), 1);
        assert_eq!(source.fetch_loads().await.unwrap().len(), 2);
        assert!(source.fetch_loads().await.unwrap().is_empty());
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_forced_error() {
        let source = MockSource::new("mock");
        source.push_batch(vec![profitable("A")]);
        source.set_error("board offline");
        assert!(source.fetch_loads().await.is_err());

        source.clear_error();
        assert_eq!(source.fetch_loads().await.unwrap().len(), 1);
    }
}
