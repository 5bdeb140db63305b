//! Request-scoped context carrier.
//!
//! # Data Flow
//! ```text
//! LogService::context()          → [logger]
//!     group_requests (root only) → [logger] ← severity ← trace ← group
//!     request extensions         → handlers extract RequestContext
//!     handler log calls          → read logger/trace, raise severity
//! ```
//!
//! # Design Decisions
//! - Persistent linked chain: `with_*` allocates a new link and never touches
//!   the parent, so parents can be shared freely across tasks
//! - Slot keys are private enum variants; no string-keyed lookup
//! - Lookups walk outward, so the innermost binding wins

mod extract;
pub mod facade;
pub mod mirror;

use std::fmt;
use std::sync::Arc;

use crate::backend::{Logger, SeverityCell};

pub use mirror::{CaptureBuffer, MirrorWriter};

#[derive(Clone)]
enum Binding {
    Logger(Arc<dyn Logger>),
    Severity(SeverityCell),
    Trace(Arc<str>),
    Group(Arc<str>),
    Mirror(MirrorWriter),
}

struct Link {
    binding: Binding,
    parent: Option<Arc<Link>>,
}

/// Immutable chain of request-scoped bindings.
///
/// Cloning is cheap: it copies one `Arc`.
#[derive(Clone, Default)]
pub struct RequestContext {
    head: Option<Arc<Link>>,
}

impl RequestContext {
    /// The empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    fn with(&self, binding: Binding) -> Self {
        Self {
            head: Some(Arc::new(Link {
                binding,
                parent: self.head.clone(),
            })),
        }
    }

    fn bindings(&self) -> impl Iterator<Item = &Binding> {
        std::iter::successors(self.head.as_deref(), |link| link.parent.as_deref())
            .map(|link| &link.binding)
    }

    pub fn with_logger(&self, logger: Arc<dyn Logger>) -> Self {
        self.with(Binding::Logger(logger))
    }

    pub fn with_severity(&self, severity: SeverityCell) -> Self {
        self.with(Binding::Severity(severity))
    }

    pub fn with_trace_id(&self, trace_id: impl Into<Arc<str>>) -> Self {
        self.with(Binding::Trace(trace_id.into()))
    }

    /// Mark the context as belonging to the request group `group_id`.
    pub fn with_group(&self, group_id: impl Into<Arc<str>>) -> Self {
        self.with(Binding::Group(group_id.into()))
    }

    pub fn with_mirror(&self, mirror: MirrorWriter) -> Self {
        self.with(Binding::Mirror(mirror))
    }

    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.bindings().find_map(|b| match b {
            Binding::Logger(logger) => Some(logger),
            _ => None,
        })
    }

    pub fn severity(&self) -> Option<&SeverityCell> {
        self.bindings().find_map(|b| match b {
            Binding::Severity(cell) => Some(cell),
            _ => None,
        })
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.bindings().find_map(|b| match b {
            Binding::Trace(id) => Some(&**id),
            _ => None,
        })
    }

    pub fn group(&self) -> Option<&str> {
        self.bindings().find_map(|b| match b {
            Binding::Group(id) => Some(&**id),
            _ => None,
        })
    }

    pub fn mirror(&self) -> Option<&MirrorWriter> {
        self.bindings().find_map(|b| match b {
            Binding::Mirror(mirror) => Some(mirror),
            _ => None,
        })
    }

    /// True when the context already belongs to a request group.
    pub fn is_grouped(&self) -> bool {
        self.group().is_some()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("logger", &self.logger().map(|l| l.log_id().to_owned()))
            .field("severity", &self.severity().map(SeverityCell::get))
            .field("trace_id", &self.trace_id())
            .field("group", &self.group())
            .field("mirror", &self.mirror().is_some())
            .finish()
    }
}
