//! Observability of the process itself.
//!
//! # Data Flow
//! ```text
//! Grouping middleware, per-call logger
//!     → metrics.rs (entry counters, grouped request histogram)
//!     → Prometheus scrape endpoint (optional)
//!
//! Backend failures, server lifecycle
//!     → tracing events
//!     → logging.rs (fmt or JSON subscriber on stderr)
//! ```
//!
//! # Design Decisions
//! - Process diagnostics go through `tracing`, never through the log service
//!   they describe
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
