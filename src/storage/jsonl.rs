//! JSON Lines Files
//!
//! Input: one object per line carrying a string `prompt`, other keys ignored.
//! Output: one `{"prompt", "response"}` object per line, in slot order.

use super::ResponseRecord;
use crate::error::GenError;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::error::Category;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
struct PromptRecord {
    prompt: String,
}

/// Read every prompt from `path` in file order. Any bad line fails the whole load.
pub async fn load_prompts(path: impl AsRef<Path>) -> Result<Vec<String>, GenError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).await?;

    let prompts = parse_prompts(&content)?;
    tracing::debug!("[jsonl] Loaded {} prompts from {:?}", prompts.len(), path);
    Ok(prompts)
}

fn parse_prompts(content: &str) -> Result<Vec<String>, GenError> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            let line_no = idx + 1;
            serde_json::from_str::<PromptRecord>(line.trim())
                .map(|record| record.prompt)
                .map_err(|source| match source.classify() {
                    Category::Data => GenError::InvalidRecord {
                        line: line_no,
                        source,
                    },
                    _ => GenError::MalformedLine {
                        line: line_no,
                        source,
                    },
                })
        })
        .collect()
}

/// Write `records` to `path`, one JSON object per line, replacing any
/// existing file. Parent directories are created as needed.
pub async fn save_responses(path: impl AsRef<Path>, records: &[ResponseRecord]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .context(format!("Failed to create output directory: {:?}", parent))?;
    }

    let mut out = String::new();
    for record in records {
        let line = serde_json::to_string(record).context("Failed to serialize response record")?;
        out.push_str(&line);
        out.push('\n');
    }

    fs::write(path, out)
        .await
        .context(format!("Failed to write output file: {:?}", path))?;

    tracing::debug!("[jsonl] Saved {} records to {:?}", records.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_keeps_order_and_ignores_extra_keys() {
        let content = concat!(
            r#"{"key": 1, "prompt": "first", "instruction_id_list": ["a"]}"#,
            "\n",
            r#"{"prompt": "second"}"#,
            "\n",
            r#"  {"prompt": "third"}  "#,
            "\n",
        );

        let prompts = parse_prompts(content).unwrap();
        assert_eq!(prompts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_parse_empty_content() {
        assert!(parse_prompts("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let content = "{\"prompt\": \"ok\"}\n{\"prompt\": \n";
        match parse_prompts(content) {
            Err(GenError::MalformedLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed line error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_line_is_fatal() {
        let content = "{\"prompt\": \"a\"}\n\n{\"prompt\": \"b\"}\n";
        assert!(matches!(
            parse_prompts(content),
            Err(GenError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_or_non_string_prompt_is_fatal() {
        let missing = "{\"prompt\": \"ok\"}\n{\"text\": \"no prompt\"}\n";
        assert!(matches!(
            parse_prompts(missing),
            Err(GenError::InvalidRecord { line: 2, .. })
        ));

        let wrong_type = "{\"prompt\": 42}\n";
        assert!(matches!(
            parse_prompts(wrong_type),
            Err(GenError::InvalidRecord { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompts(temp_dir.path().join("nope.jsonl")).await;
        assert!(matches!(result, Err(GenError::Io(_))));
    }

    #[tokio::test]
    async fn test_save_creates_parents_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/responses.jsonl");

        let first = vec![
            ResponseRecord {
                prompt: "a".to_string(),
                response: "1".to_string(),
            },
            ResponseRecord {
                prompt: "b".to_string(),
                response: "2".to_string(),
            },
        ];
        save_responses(&path, &first).await.unwrap();

        let second = vec![ResponseRecord {
            prompt: "Grüße".to_string(),
            response: "こんにちは".to_string(),
        }];
        save_responses(&path, &second).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\"prompt\":\"Grüße\",\"response\":\"こんにちは\"}\n"
        );
    }

    #[tokio::test]
    async fn test_save_empty_batch_writes_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.jsonl");

        save_responses(&path, &[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_saved_file_reloads_as_prompts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.jsonl");

        let records = vec![ResponseRecord::pending("line one"), ResponseRecord::pending("two")];
        save_responses(&path, &records).await.unwrap();

        // output lines carry `prompt`, so they are valid input too
        let prompts = load_prompts(&path).await.unwrap();
        assert_eq!(prompts, vec!["line one", "two"]);
    }
}
