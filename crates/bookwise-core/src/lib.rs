pub mod config;
pub mod error;
pub mod text;
pub mod prompt;
pub mod ai;
pub mod storage;
pub mod chat;

pub use config::AppConfig;
pub use error::{Error, Result};
