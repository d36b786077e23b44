use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use btleplug::api::{Characteristic, WriteType};

use crate::inner::error::{LinkError, LinkResult};
use crate::inner::model::connection_handle::{ConnectionHandle, HandleId};
use crate::inner::model::transport_event::WriteId;
use crate::inner::transport::BleTransport;

#[derive(Debug, Clone)]
pub(crate) enum TransportCall {
    Connect(String),
    DiscoverServices(HandleId),
    Write {
        handle: HandleId,
        write: WriteId,
        payload: Vec<u8>,
        write_type: WriteType,
    },
    Disconnect(HandleId),
    Release(HandleId),
}

/// Transport double that records every call and accepts operations unless told otherwise.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_handle: AtomicU64,
    reject_writes: AtomicBool,
    no_adapter: AtomicBool,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub(crate) fn set_no_adapter(&self, no_adapter: bool) {
        self.no_adapter.store(no_adapter, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn writes(&self) -> Vec<(Vec<u8>, WriteType)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Write { payload, write_type, .. } => Some((payload, write_type)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn written_payloads(&self) -> Vec<Vec<u8>> {
        self.writes().into_iter().map(|(payload, _)| payload).collect()
    }

    pub(crate) fn connects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::Connect(_)))
            .count()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl BleTransport for RecordingTransport {
    fn connect(&self, device_id: &str) -> LinkResult<ConnectionHandle> {
        if self.no_adapter.load(Ordering::SeqCst) {
            return Err(LinkError::AdapterUnavailable);
        }
        self.record(TransportCall::Connect(device_id.to_string()));
        Ok(ConnectionHandle {
            id: HandleId(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1),
            device_id: Arc::new(device_id.to_string()),
        })
    }

    fn discover_services(&self, handle: &ConnectionHandle) -> LinkResult<()> {
        self.record(TransportCall::DiscoverServices(handle.id));
        Ok(())
    }

    fn write_characteristic(
        &self,
        handle: &ConnectionHandle,
        write: WriteId,
        _characteristic: &Characteristic,
        payload: &[u8],
        write_type: WriteType,
    ) -> LinkResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(LinkError::ConnectionClosed(handle.id));
        }
        self.record(TransportCall::Write {
            handle: handle.id,
            write,
            payload: payload.to_vec(),
            write_type,
        });
        Ok(())
    }

    fn disconnect(&self, handle: &ConnectionHandle) -> LinkResult<()> {
        self.record(TransportCall::Disconnect(handle.id));
        Ok(())
    }

    fn release(&self, handle: ConnectionHandle) {
        self.record(TransportCall::Release(handle.id));
    }
}
