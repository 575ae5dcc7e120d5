//! Mock describer for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::describer::{Describer, Description};

/// A recorded describe call.
#[derive(Debug, Clone)]
pub struct RecordedDescribe {
    pub image_url: String,
    pub keywords: Vec<String>,
}

/// Mock implementation of the `Describer` trait.
#[derive(Clone)]
pub struct MockDescriber {
    calls: Arc<RwLock<Vec<RecordedDescribe>>>,
    failing: Arc<RwLock<bool>>,
    connection_ok: Arc<RwLock<bool>>,
    text: Arc<RwLock<String>>,
}

impl Default for MockDescriber {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDescriber {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(false)),
            connection_ok: Arc::new(RwLock::new(true)),
            text: Arc::new(RwLock::new("a generated description".to_string())),
        }
    }

    /// Make every subsequent describe call return a failed description.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn set_connection_ok(&self, ok: bool) {
        *self.connection_ok.write().await = ok;
    }

    pub async fn set_text(&self, text: impl Into<String>) {
        *self.text.write().await = text.into();
    }

    pub async fn calls(&self) -> Vec<RecordedDescribe> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Describer for MockDescriber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn describe(&self, image_url: &str, keywords: &[String]) -> Description {
        self.calls.write().await.push(RecordedDescribe {
            image_url: image_url.to_string(),
            keywords: keywords.to_vec(),
        });

        if *self.failing.read().await {
            Description::failed(keywords.to_vec())
        } else {
            Description::complete(self.text.read().await.clone(), keywords.to_vec())
        }
    }

    async fn test_connection(&self) -> bool {
        *self.connection_ok.read().await
    }
}
