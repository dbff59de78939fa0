//! Connectivity probe and risk-sized futures order workflow.
//!
//! # Key Components
//!
//! - [`ConnectivityProber`]: advisory server-time check reporting clock offset
//! - [`FuturesOrderExecutor`]: one sizing-and-submit pass per [`RunPlan`]
//!
//! # Workflow (in `FuturesOrderExecutor::execute`)
//!
//! 1. set leverage      → policy: continue or `LeverageRejected`
//! 2. fetch balance     → `NoBalanceData`
//! 3. fetch price       → `PriceUnavailable`
//! 4. size              → `Sizing(InsufficientBalance | InvalidPrice | ..)`
//! 5. submit order      → `OrderRejected`
//!
//! Every remote call runs at most once under an explicit timeout. A
//! cancellation token is checked before each step, never during a call.

pub mod error;
pub mod prober;
pub mod workflow;

pub use error::{ErrorKind, ExecutorError, ExecutorResult, WorkflowError};
pub use prober::{ClockSync, ConnectivityProber, DEFAULT_SYNC_TOLERANCE_MS};
pub use workflow::{
    ExecutorConfig, FuturesOrderExecutor, LeverageFailurePolicy, RunPlan, WorkflowReport,
    WorkflowState,
};
