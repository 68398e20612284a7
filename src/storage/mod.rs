//! Prompt and Response Storage
//!
//! Information Hiding:
//! - JSON-lines parsing and line numbering hidden behind load/save functions
//! - Callers see ordered prompts in and ordered records out

use serde::{Deserialize, Serialize};

pub mod jsonl;

pub use jsonl::{load_prompts, save_responses};

/// One generated answer, persisted as a single JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub prompt: String,
    /// Empty when the request for this prompt failed
    pub response: String,
}

impl ResponseRecord {
    /// Placeholder for a slot whose request has not completed yet.
    pub fn pending(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            response: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.response.is_empty()
    }
}
