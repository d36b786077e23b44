use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub(crate) struct HandleId(pub(crate) u64);

impl Display for HandleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to one transport connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectionHandle {
    pub(crate) id: HandleId,
    pub(crate) device_id: Arc<String>,
}

impl Display for ConnectionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.device_id, self.id)
    }
}
