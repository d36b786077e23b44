use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use btleplug::api::Service;

use crate::inner::model::connection_handle::HandleId;

/// Identifies one dispatched write, so completions can be matched to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct WriteId(pub(crate) u64);

impl Display for WriteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum TransportEventKind {
    Connected,
    Disconnected,
    ServicesDiscovered(BTreeSet<Service>),
    /// Only emitted for with-response writes.
    WriteCompleted { write: WriteId, success: bool },
}

#[derive(Debug, Clone)]
pub(crate) struct TransportEvent {
    pub(crate) handle: HandleId,
    pub(crate) kind: TransportEventKind,
}

impl TransportEvent {
    pub(crate) fn new(handle: HandleId, kind: TransportEventKind) -> Self {
        Self { handle, kind }
    }
}
