//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Start server
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast to tasks → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the pool, then workers and server
//! - Ordered shutdown: stop workers and timer, let in-flight requests finish
//! - Shutdown drain has a deadline: forced exit after it passes

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
