//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] lev_gateway::GatewayError),

    #[error("Registry error: {0}")]
    Registry(#[from] lev_registry::RegistryError),

    #[error("Executor error: {0}")]
    Executor(#[from] lev_executor::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] lev_telemetry::TelemetryError),

    #[error("Workflow task failed: {0}")]
    Task(String),
}

pub type AppResult<T> = Result<T, AppError>;
