use std::collections::BTreeSet;

use btleplug::api::Service;
use tracing::{debug, error, info, warn};

use crate::inner::error::LinkError;
use crate::inner::link::HelmetLink;
use crate::inner::metrics::{CONNECTING_ERRORS, CONNECTIONS_DROPPED, CONNECTIONS_STARTED};
use crate::inner::model::connection_target::{ConnectionTarget, StartRequestDto};
use crate::inner::model::link_state::LinkState;
use crate::inner::model::transport_event::{TransportEvent, TransportEventKind};

impl HelmetLink {
    #[tracing::instrument(level = "info", skip_all, fields(device = ? request.device_id))]
    pub(crate) fn start(&mut self, request: &StartRequestDto) {
        let target = match ConnectionTarget::try_from(request) {
            Ok(target) => target,
            Err(LinkError::EmptyDeviceId) => {
                debug!("No device id given, ignoring start");
                return;
            }
            Err(err) => {
                error!(%err, "Invalid connection target");
                CONNECTING_ERRORS.increment();
                return;
            }
        };

        if self.handle.is_some() {
            warn!(state = %self.state, "Restarting link, releasing the previous connection");
            self.teardown();
        }

        match self.transport.connect(&target.device_id) {
            Ok(handle) => {
                info!(%handle, %target, "Connecting to peripheral");
                CONNECTIONS_STARTED.increment();
                self.handle = Some(handle);
                self.target = Some(target);
                self.state = LinkState::Connecting;
            }
            Err(LinkError::AdapterUnavailable) => {
                debug!("No adapter available, ignoring start");
            }
            Err(err) => {
                error!(?err, "Failed to request connection");
                CONNECTING_ERRORS.increment();
            }
        }
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub(crate) fn stop(&mut self) {
        self.target = None;
        if self.handle.is_none() {
            debug!("Already stopped");
            self.characteristic = None;
            self.state = LinkState::Idle;
            return;
        }

        info!("Stopping link");
        self.teardown();
    }

    /// Disconnects and releases the current handle; the queue is kept.
    fn teardown(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = self.transport.disconnect(&handle) {
                warn!(%handle, ?err, "Failed to disconnect");
            }
            self.transport.release(handle);
        }
        self.characteristic = None;
        self.pacer.unblock();
        self.state = LinkState::Idle;
    }

    pub(crate) fn handle_transport_event(&mut self, event: TransportEvent) {
        let Some(handle) = self.handle.as_ref() else {
            debug!(
                handle = %event.handle,
                kind = ?event.kind,
                "Ignoring event, no active connection"
            );
            return;
        };
        if handle.id != event.handle {
            debug!(
                handle = %event.handle,
                current = %handle.id,
                "Ignoring event for a released connection"
            );
            return;
        }

        match event.kind {
            TransportEventKind::Connected => self.on_connected(),
            TransportEventKind::Disconnected => self.on_disconnected(),
            TransportEventKind::ServicesDiscovered(services) => {
                self.on_services_discovered(services)
            }
            TransportEventKind::WriteCompleted { write, success } => {
                self.on_write_completed(write, success)
            }
        }
    }

    fn on_connected(&mut self) {
        if self.state != LinkState::Connecting {
            debug!(state = %self.state, "Ignoring connected event");
            return;
        }
        let Some(handle) = self.handle.as_ref() else {
            return;
        };

        info!(%handle, "Connected, discovering services");
        match self.transport.discover_services(handle) {
            Ok(()) => self.state = LinkState::DiscoveringServices,
            Err(err) => {
                error!(%handle, ?err, "Failed to request service discovery");
                CONNECTING_ERRORS.increment();
                self.teardown();
            }
        }
    }

    fn on_disconnected(&mut self) {
        CONNECTIONS_DROPPED.increment();
        if let Some(handle) = self.handle.take() {
            warn!(%handle, state = %self.state, "Peripheral disconnected");
            self.transport.release(handle);
        }
        self.characteristic = None;
        self.pacer.unblock();
        self.state = LinkState::Idle;
    }

    fn on_services_discovered(&mut self, services: BTreeSet<Service>) {
        let Some(target) = self.target.as_ref() else {
            return;
        };

        let characteristic = services
            .into_iter()
            .find(|service| service.uuid == target.service_uuid)
            .and_then(|service| {
                service
                    .characteristics
                    .into_iter()
                    .find(|characteristic| characteristic.uuid == target.characteristic_uuid)
            });

        match characteristic {
            Some(characteristic) => {
                info!(
                    characteristic = %characteristic.uuid,
                    properties = ?characteristic.properties,
                    "Characteristic resolved, link ready"
                );
                self.characteristic = Some(characteristic);
                self.state = LinkState::Ready;
            }
            None => {
                warn!(%target, "Target characteristic not found, writes will not be dispatched");
                self.characteristic = None;
                self.state = LinkState::DiscoveringServices;
            }
        }

        self.drain();
    }
}
