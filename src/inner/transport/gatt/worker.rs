use std::pin::Pin;
use std::sync::Arc;

use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral, PeripheralId};
use dashmap::DashMap;
use futures_util::{Stream, StreamExt};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Span};

use crate::inner::conf::cmd_args::AppConf;
use crate::inner::error::{LinkError, LinkResult};
use crate::inner::metrics::measure_execution_time::Measure;
use crate::inner::metrics::{CONNECTING_DURATION, SERVICE_DISCOVERY_DURATION, WRITE_DURATION};
use crate::inner::model::connection_handle::{ConnectionHandle, HandleId};
use crate::inner::model::transport_event::{TransportEvent, TransportEventKind, WriteId};
use crate::inner::transport::gatt::ext::CentralEventExt;
use crate::inner::transport::gatt::{attach_peripheral, ConnectionOp, GattConnection};

pub(super) type CentralEvents = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;

pub(super) struct ConnectionWorker {
    pub(super) handle: ConnectionHandle,
    pub(super) adapter: Arc<Adapter>,
    pub(super) connections: Arc<DashMap<HandleId, GattConnection>>,
    pub(super) event_sender: AsyncSender<TransportEvent>,
    pub(super) app_conf: Arc<AppConf>,
}

async fn emit(
    event_sender: &AsyncSender<TransportEvent>,
    handle: HandleId,
    kind: TransportEventKind,
) {
    if let Err(err) = event_sender.send(TransportEvent::new(handle, kind)).await {
        error!(%handle, ?err, "Link service is gone, dropping transport event");
    }
}

impl ConnectionWorker {
    #[tracing::instrument(
        level = "info",
        name = "gatt_connection",
        skip_all,
        parent = &_parent_span,
        fields(device = %self.handle.device_id, handle = %self.handle.id)
    )]
    pub(super) async fn run(self, ops: AsyncReceiver<ConnectionOp>, _parent_span: Span) {
        let (peripheral, events) = match self.establish().await {
            Ok(connected) => connected,
            Err(err) => {
                warn!(?err, "Failed to connect to peripheral");
                emit(&self.event_sender, self.handle.id, TransportEventKind::Disconnected).await;
                return;
            }
        };

        if !self.register(&peripheral, events) {
            debug!("Connection released while connecting");
            let disconnect_timeout = self.app_conf.peripheral_connect_timeout;
            disconnect_peripheral(peripheral, disconnect_timeout, &self.handle).await;
            return;
        }
        emit(&self.event_sender, self.handle.id, TransportEventKind::Connected).await;

        while let Ok(op) = ops.recv().await {
            match op {
                ConnectionOp::DiscoverServices => self.discover_services(&peripheral).await,
                ConnectionOp::Write {
                    write,
                    characteristic,
                    payload,
                    write_type,
                } => {
                    self.write(&peripheral, write, &characteristic, &payload, write_type)
                        .await
                }
            }
        }

        debug!("Connection worker finished");
    }

    async fn establish(&self) -> LinkResult<(Arc<Peripheral>, CentralEvents)> {
        let events = self.adapter.events().await?;
        let peripheral = Arc::new(self.resolve_peripheral().await?);

        // reachable by `disconnect` from here on, even while connect is pending
        if !attach_peripheral(&self.connections, self.handle.id, &peripheral) {
            return Err(LinkError::UnknownHandle(self.handle.id));
        }

        if peripheral.is_connected().await? {
            debug!("Already connected");
        } else {
            info!("Connecting to peripheral");
            timeout(self.app_conf.peripheral_connect_timeout, peripheral.connect())
                .measure_execution_time(&CONNECTING_DURATION, Span::current())
                .await??;
            info!("Connected to peripheral");
        }

        Ok((peripheral, events))
    }

    /// Starts the disconnect monitor. Returns `false` when the handle has been released
    /// in the meantime.
    fn register(&self, peripheral: &Arc<Peripheral>, events: CentralEvents) -> bool {
        let Some(mut connection) = self.connections.get_mut(&self.handle.id) else {
            return false;
        };

        connection.tasks.push(tokio::spawn(monitor_disconnect(
            events,
            peripheral.id(),
            self.handle.id,
            self.event_sender.clone(),
        )));
        true
    }

    async fn discover_services(&self, peripheral: &Peripheral) {
        let result = peripheral
            .discover_services()
            .measure_execution_time(&SERVICE_DISCOVERY_DURATION, Span::current())
            .await;

        let services = match result {
            Ok(()) => peripheral.services(),
            Err(err) => {
                error!(?err, "Service discovery failed");
                Default::default()
            }
        };
        info!(services = services.len(), "Services discovered");

        emit(
            &self.event_sender,
            self.handle.id,
            TransportEventKind::ServicesDiscovered(services),
        )
        .await;
    }

    async fn write(
        &self,
        peripheral: &Peripheral,
        write: WriteId,
        characteristic: &Characteristic,
        payload: &[u8],
        write_type: WriteType,
    ) {
        let write_timeout = self.app_conf.write_timeout;
        let result = timeout(write_timeout, peripheral.write(characteristic, payload, write_type))
            .measure_execution_time(&WRITE_DURATION, Span::current())
            .await;

        let success = match result {
            Ok(Ok(())) => {
                debug!(%write, bytes = payload.len(), ?write_type, "Characteristic written");
                true
            }
            Ok(Err(err)) => {
                warn!(%write, ?err, "Characteristic write failed");
                false
            }
            Err(_) => {
                warn!(%write, timeout = ?write_timeout, "Characteristic write timed out");
                false
            }
        };

        if matches!(write_type, WriteType::WithResponse) {
            emit(
                &self.event_sender,
                self.handle.id,
                TransportEventKind::WriteCompleted { write, success },
            )
            .await;
        }
    }
}

pub(super) async fn disconnect_peripheral(
    peripheral: Arc<Peripheral>,
    disconnect_timeout: std::time::Duration,
    handle: &ConnectionHandle,
) {
    match timeout(disconnect_timeout, peripheral.disconnect()).await {
        Ok(Ok(())) => info!(%handle, "Disconnected from peripheral"),
        Ok(Err(err)) => warn!(%handle, ?err, "Failed to disconnect from peripheral"),
        Err(_) => warn!(%handle, "Timed out disconnecting from peripheral"),
    }
}

async fn monitor_disconnect(
    mut events: CentralEvents,
    peripheral_id: PeripheralId,
    handle: HandleId,
    event_sender: AsyncSender<TransportEvent>,
) {
    while let Some(event) = events.next().await {
        if event.disconnected_peripheral_id() == Some(&peripheral_id) {
            warn!(%handle, "Adapter reported peripheral disconnected");
            break;
        }
    }
    emit(&event_sender, handle, TransportEventKind::Disconnected).await;
}
