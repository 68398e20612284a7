use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("failed to parse completion: {0}")]
    SchemaParse(String),

    #[error("empty choices or null content")]
    EmptyCompletion,

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid JSON")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: record has no string `prompt` field")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
