//! Batchgen - batched chat-completion generation
//!
//! Sends every prompt of a JSONL file to an OpenAI-compatible endpoint with
//! bounded concurrency and writes the prompt/response pairs back in input
//! order. Failed requests are recorded as empty responses.

mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

pub mod api;
pub mod cli;

pub use api::*;
pub use crate::config::{DispatchConfig, HttpConfig, LoggingConfig, Settings};
pub use error::GenError;
pub use storage::ResponseRecord;
