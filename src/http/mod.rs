//! HTTP integration.
//!
//! # Data Flow
//! ```text
//! client request
//!     → server.rs      (catch-panic, trace, request id, timeout)
//!     → grouping.rs    (root or nested? mint trace id at the root)
//!     → handler        (logs through the RequestContext extractor)
//!     → observer.rs    (status + last write size as the body streams out)
//!     → grouping.rs    (one aggregate entry per root request)
//! ```

pub mod grouping;
pub mod observer;
pub mod request;
pub mod server;
pub mod trace_id;

pub use grouping::{group_requests, Grouping, EMPTY_URL_PLACEHOLDER};
pub use observer::{observe, Observed, ResponseObserver};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use trace_id::TraceIdGenerator;
