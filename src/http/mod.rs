//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → server.rs (Axum setup, timeout/limit/trace layers)
//!     → handlers.rs (extract, dispatch to subsystem)
//!         submit lines → parser → pool store
//!         pool query   → pool store snapshot
//!         analysis     → pool + inventories → report
//!     → JSON response
//! ```

pub mod handlers;
pub mod server;

pub use handlers::{PoolQueryParams, RetentionResponse, StatusResponse, SubmitLinesRequest};
pub use server::{ApiServer, AppState};
