//! Generation pipeline
//!
//! Loads prompts, fans them out to the endpoint with bounded concurrency and
//! writes one record per prompt back to disk in input order.

use crate::config::Settings;
use crate::core::{ChatClient, ChatParams};
use crate::storage::{self, ResponseRecord};
use crate::utils;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

pub use batch::{process_prompts, BatchOptions};

/// Everything one run needs, resolved from the command line
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub input_data: PathBuf,
    pub output_path: PathBuf,
    pub model_name: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    /// Records whose request failed
    pub empty: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[ResponseRecord]) -> Self {
        Self {
            total: records.len(),
            empty: records.iter().filter(|r| r.is_empty()).count(),
        }
    }
}

/// Run a full generation pass.
///
/// Setup and output failures are returned as errors. Failed requests are not:
/// they show up as empty responses in the output file and in
/// [`BatchSummary::empty`].
pub async fn generate_responses(
    request: &GenerateRequest,
    settings: &Settings,
) -> Result<BatchSummary> {
    utils::print_header("Batch generation");
    utils::print_info(&format!("Loading data from {}", request.input_data.display()));
    let prompts = storage::load_prompts(&request.input_data)
        .await
        .with_context(|| format!("Failed to load prompts from {:?}", request.input_data))?;

    utils::print_info(&format!("Found {} prompts to process", prompts.len()));
    utils::print_field("Model", &request.model_name);
    utils::print_field("Base URL", &request.base_url);
    utils::print_field("Workers", request.workers);
    utils::print_field("Temperature", request.temperature);
    utils::print_field("Max tokens", request.max_tokens);

    let params = ChatParams {
        model: request.model_name.clone(),
        base_url: request.base_url.clone(),
        api_key: request.api_key.clone(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };
    let client = ChatClient::new(params, &settings.http, request.workers)
        .context("Failed to build HTTP client")?;
    tracing::info!("Sending requests to {}", client.endpoint());

    let progress = if settings.dispatch.progress {
        progress_bar(prompts.len())?
    } else {
        ProgressBar::hidden()
    };

    let options = BatchOptions {
        concurrency: request.workers,
        error_preview_chars: settings.dispatch.error_preview_chars,
    };
    let records = process_prompts(&client, &prompts, &options, &progress).await;
    progress.finish_and_clear();

    utils::print_info(&format!("Saving responses to {}", request.output_path.display()));
    storage::save_responses(&request.output_path, &records).await?;

    let summary = BatchSummary::from_records(&records);
    utils::print_success(&format!("✅ Generated {} responses", summary.total));
    if summary.empty > 0 {
        utils::print_warning(&format!(
            "{} of {} requests failed and were saved with an empty response",
            summary.empty, summary.total
        ));
    }

    Ok(summary)
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let progress = ProgressBar::new(len as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );
    progress.set_message("Generating responses");
    Ok(progress)
}

/// Bounded fan-out / ordered fan-in over a [`Completer`](crate::core::Completer)
pub mod batch {
    use crate::core::Completer;
    use crate::storage::ResponseRecord;
    use crate::utils;
    use futures::stream::{self, StreamExt};
    use futures::FutureExt;
    use indicatif::ProgressBar;
    use std::panic::AssertUnwindSafe;

    #[derive(Debug, Clone)]
    pub struct BatchOptions {
        /// Maximum requests in flight at once
        pub concurrency: usize,
        pub error_preview_chars: usize,
    }

    impl Default for BatchOptions {
        fn default() -> Self {
            Self {
                concurrency: 50,
                error_preview_chars: 100,
            }
        }
    }

    /// Complete every prompt, at most `options.concurrency` at a time.
    ///
    /// The returned vector has one record per prompt and `records[i]` always
    /// belongs to `prompts[i]`, whatever order the requests finish in. A
    /// request that errors or panics leaves an empty response in its slot and
    /// never affects the others.
    pub async fn process_prompts<C>(
        completer: &C,
        prompts: &[String],
        options: &BatchOptions,
        progress: &ProgressBar,
    ) -> Vec<ResponseRecord>
    where
        C: Completer + ?Sized,
    {
        let mut slots: Vec<ResponseRecord> =
            prompts.iter().map(|p| ResponseRecord::pending(p)).collect();
        let preview_chars = options.error_preview_chars;

        let mut completed = stream::iter(prompts.iter().enumerate())
            .map(|(idx, prompt)| async move { (idx, complete_one(completer, prompt).await) })
            .buffer_unordered(options.concurrency.max(1));

        let mut filled = 0;
        while let Some((idx, outcome)) = completed.next().await {
            slots[idx].response = match outcome {
                Outcome::Completed(text) => text,
                Outcome::Failed(message) => {
                    // keep the bar from being torn by the log line
                    progress.suspend(|| {
                        tracing::error!(
                            index = idx,
                            "Request failed: {}",
                            utils::preview(&message, preview_chars)
                        )
                    });
                    String::new()
                }
                Outcome::Panicked => {
                    progress.suspend(|| tracing::error!(index = idx, "Request panicked"));
                    String::new()
                }
            };
            filled += 1;
            progress.inc(1);
        }
        debug_assert_eq!(filled, prompts.len());

        slots
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Outcome {
        Completed(String),
        Failed(String),
        Panicked,
    }

    async fn complete_one<C>(completer: &C, prompt: &str) -> Outcome
    where
        C: Completer + ?Sized,
    {
        match AssertUnwindSafe(completer.complete(prompt)).catch_unwind().await {
            Ok(Ok(text)) => Outcome::Completed(text),
            Ok(Err(e)) => Outcome::Failed(e.to_string()),
            Err(_) => Outcome::Panicked,
        }
    }

}
