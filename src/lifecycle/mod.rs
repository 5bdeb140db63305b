//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Connect backend → LogService → Grouping
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Resolve shutdown future → Server drains → LogService::close
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the log service, then listeners
//! - The log service is closed only after the server has stopped, so
//!   in-flight requests can still emit their aggregate entries

pub mod signals;
pub mod startup;
