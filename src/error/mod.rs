mod agent;
mod app;
mod backend;
mod config;
mod control;
mod storage;

pub use agent::AgentError;
pub use app::{AppError, AppResult};
pub use backend::BackendError;
pub use config::ConfigError;
pub use control::ControlError;
pub use storage::StorageError;
