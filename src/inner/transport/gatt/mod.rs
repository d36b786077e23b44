use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use btleplug::api::{Central, Characteristic, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use dashmap::DashMap;
use kanal::AsyncSender;
use tokio::task::JoinHandle;
use tracing::{debug, Span};

use crate::inner::conf::cmd_args::AppConf;
use crate::inner::error::{LinkError, LinkResult};
use crate::inner::model::connection_handle::{ConnectionHandle, HandleId};
use crate::inner::model::transport_event::{TransportEvent, WriteId};
use crate::inner::transport::gatt::worker::{disconnect_peripheral, ConnectionWorker};
use crate::inner::transport::BleTransport;

pub(crate) mod adapter;
mod ext;
mod resolve;
mod worker;

pub(super) enum ConnectionOp {
    DiscoverServices,
    Write {
        write: WriteId,
        characteristic: Characteristic,
        payload: Vec<u8>,
        write_type: WriteType,
    },
}

pub(super) struct GattConnection<P = Peripheral> {
    /// Set as soon as the peripheral is resolved, before connecting to it.
    peripheral: Option<Arc<P>>,
    ops: AsyncSender<ConnectionOp>,
    tasks: Vec<JoinHandle<()>>,
}

impl<P> GattConnection<P> {
    fn new(ops: AsyncSender<ConnectionOp>) -> Self {
        Self {
            peripheral: None,
            ops,
            tasks: vec![],
        }
    }
}

impl<P> Drop for GattConnection<P> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Returns `false` when the handle has already been released.
fn attach_peripheral<P>(
    connections: &DashMap<HandleId, GattConnection<P>>,
    handle: HandleId,
    peripheral: &Arc<P>,
) -> bool {
    match connections.get_mut(&handle) {
        Some(mut connection) => {
            connection.peripheral = Some(Arc::clone(peripheral));
            true
        }
        None => false,
    }
}

fn attached_peripheral<P>(
    connections: &DashMap<HandleId, GattConnection<P>>,
    handle: HandleId,
) -> LinkResult<Option<Arc<P>>> {
    let connection = connections
        .get(&handle)
        .ok_or(LinkError::UnknownHandle(handle))?;
    Ok(connection.peripheral.clone())
}

/// [`BleTransport`] over a btleplug adapter.
///
/// Each handle gets a worker task that connects and then runs discovery and writes one
/// at a time, in the order they were submitted.
pub(crate) struct GattTransport {
    adapter: Option<Arc<Adapter>>,
    connections: Arc<DashMap<HandleId, GattConnection>>,
    next_handle: AtomicU64,
    event_sender: AsyncSender<TransportEvent>,
    app_conf: Arc<AppConf>,
    span: Span,
}

impl GattTransport {
    pub(crate) fn new(
        adapter: Option<Adapter>,
        event_sender: AsyncSender<TransportEvent>,
        app_conf: Arc<AppConf>,
        span: Span,
    ) -> Self {
        Self {
            adapter: adapter.map(Arc::new),
            connections: Default::default(),
            next_handle: AtomicU64::new(0),
            event_sender,
            app_conf,
            span,
        }
    }

    fn submit(&self, handle: &ConnectionHandle, op: ConnectionOp) -> LinkResult<()> {
        let connection = self
            .connections
            .get(&handle.id)
            .ok_or(LinkError::UnknownHandle(handle.id))?;

        match connection.ops.try_send(op) {
            Ok(true) => Ok(()),
            _ => Err(LinkError::ConnectionClosed(handle.id)),
        }
    }
}

impl BleTransport for GattTransport {
    fn connect(&self, device_id: &str) -> LinkResult<ConnectionHandle> {
        let adapter = self.adapter.clone().ok_or(LinkError::AdapterUnavailable)?;
        let handle = ConnectionHandle {
            id: HandleId(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1),
            device_id: Arc::new(device_id.to_string()),
        };

        let (ops, receiver) = kanal::unbounded_async();
        self.connections.insert(handle.id, GattConnection::new(ops));

        let worker = ConnectionWorker {
            handle: handle.clone(),
            adapter,
            connections: Arc::clone(&self.connections),
            event_sender: self.event_sender.clone(),
            app_conf: Arc::clone(&self.app_conf),
        };
        let task = tokio::spawn(worker.run(receiver, self.span.clone()));
        if let Some(mut connection) = self.connections.get_mut(&handle.id) {
            connection.tasks.push(task);
        }

        Ok(handle)
    }

    fn discover_services(&self, handle: &ConnectionHandle) -> LinkResult<()> {
        self.submit(handle, ConnectionOp::DiscoverServices)
    }

    fn write_characteristic(
        &self,
        handle: &ConnectionHandle,
        write: WriteId,
        characteristic: &Characteristic,
        payload: &[u8],
        write_type: WriteType,
    ) -> LinkResult<()> {
        self.submit(
            handle,
            ConnectionOp::Write {
                write,
                characteristic: characteristic.clone(),
                payload: payload.to_vec(),
                write_type,
            },
        )
    }

    fn disconnect(&self, handle: &ConnectionHandle) -> LinkResult<()> {
        let disconnect_timeout = self.app_conf.peripheral_connect_timeout;

        match attached_peripheral(&self.connections, handle.id)? {
            Some(peripheral) => {
                let handle = handle.clone();
                tokio::spawn(async move {
                    disconnect_peripheral(peripheral, disconnect_timeout, &handle).await;
                });
            }
            None => {
                debug!(%handle, "Peripheral not resolved yet, stopping scan");
                if let Some(adapter) = self.adapter.clone() {
                    tokio::spawn(async move {
                        if let Err(err) = adapter.stop_scan().await {
                            debug!(?err, "Failed to stop scan");
                        }
                    });
                }
            }
        }

        Ok(())
    }

    fn release(&self, handle: ConnectionHandle) {
        if self.connections.remove(&handle.id).is_none() {
            debug!(%handle, "Connection already released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connections_with(handle: HandleId) -> DashMap<HandleId, GattConnection<&'static str>> {
        let (ops, _receiver) = kanal::unbounded_async();
        let connections = DashMap::new();
        connections.insert(handle, GattConnection::new(ops));
        connections
    }

    #[test]
    fn resolved_peripheral_is_reachable_before_connecting() {
        let handle = HandleId(7);
        let connections = connections_with(handle);
        assert_eq!(attached_peripheral(&connections, handle).unwrap(), None);

        let peripheral = Arc::new("24:6F:28:AA:10:3E");
        assert!(attach_peripheral(&connections, handle, &peripheral));
        assert_eq!(
            attached_peripheral(&connections, handle).unwrap(),
            Some(peripheral)
        );
    }

    #[test]
    fn released_handle_refuses_peripheral() {
        let handle = HandleId(7);
        let connections = connections_with(handle);
        connections.remove(&handle);

        assert!(!attach_peripheral(&connections, handle, &Arc::new("24:6F:28:AA:10:3E")));
        assert!(matches!(
            attached_peripheral(&connections, handle),
            Err(LinkError::UnknownHandle(HandleId(7)))
        ));
    }
}
