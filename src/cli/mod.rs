mod args;

pub use args::{resolve_api_key, Cli, FALLBACK_API_KEY};
