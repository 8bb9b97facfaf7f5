//! Transport guard: decides whether a live transport can be used at all.
//!
//! When the guard fails, the session installs an inert implementation instead
//! of erroring.

use std::fmt;
use std::sync::Arc;

use crate::transport::Medium;

/// Where the replica is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionContext {
    /// A live, interactive replica whose peers can observe broadcasts.
    Interactive,
    /// A non-interactive render pass; broadcasting is meaningless here.
    ServerRender,
}

/// What the environment offers the session.
#[derive(Clone)]
pub struct Capability {
    pub context: ExecutionContext,
    pub medium: Option<Arc<dyn Medium>>,
}

impl Capability {
    /// An interactive context with a usable medium.
    pub fn interactive(medium: Arc<dyn Medium>) -> Self {
        Self {
            context: ExecutionContext::Interactive,
            medium: Some(medium),
        }
    }

    /// A server-side render pass. The medium, if any, is carried for observers only.
    pub fn server_render(medium: Option<Arc<dyn Medium>>) -> Self {
        Self {
            context: ExecutionContext::ServerRender,
            medium,
        }
    }

    /// A context with no broadcast primitive.
    pub fn unavailable(context: ExecutionContext) -> Self {
        Self {
            context,
            medium: None,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("context", &self.context)
            .field("medium", &self.medium.as_ref().map(|_| "<medium>"))
            .finish()
    }
}

/// Whether a live transport may be installed.
///
/// Requires an interactive context and an available medium.
pub fn can_broadcast(capability: &Capability) -> bool {
    capability.context == ExecutionContext::Interactive && capability.medium.is_some()
}
