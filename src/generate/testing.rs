//! Offline generator for tests

use super::Generator;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Answers by quoting its context
#[derive(Default)]
pub struct EchoGenerator {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl EchoGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, _question: &str, context: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Generation(
                "Chat API error (503): unavailable".to_string(),
            ));
        }
        Ok(format!("According to the documents: {}", context.join(" ")))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}
