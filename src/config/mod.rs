mod settings;

pub use settings::{DispatchConfig, HttpConfig, LoggingConfig, Settings};
