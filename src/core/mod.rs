pub mod llm;

pub use llm::{ChatClient, ChatParams, Completer};
