use std::sync::Arc;
use std::time::Duration;

use btleplug::api::Characteristic;

use crate::inner::link::pacer::Pacer;
use crate::inner::link::queue::OutboundQueue;
use crate::inner::model::connection_handle::ConnectionHandle;
use crate::inner::model::connection_target::ConnectionTarget;
use crate::inner::model::link_command::LinkCommand;
use crate::inner::model::link_state::LinkState;
use crate::inner::model::link_status::{LinkStatus, WritableCharacteristicDto};
use crate::inner::transport::BleTransport;

mod drain;
pub(crate) mod handle;
mod lifecycle;
mod pacer;
mod queue;
pub(crate) mod service;

/// Connection lifecycle plus the outbound queue for a single helmet.
///
/// Not synchronized: owned by one [`LinkService`](service::LinkService) task, which runs
/// every command and transport event to completion before taking the next.
pub(crate) struct HelmetLink {
    transport: Arc<dyn BleTransport>,
    state: LinkState,
    target: Option<ConnectionTarget>,
    handle: Option<ConnectionHandle>,
    characteristic: Option<Characteristic>,
    queue: OutboundQueue,
    pacer: Pacer,
    write_watchdog: Option<Duration>,
}

impl HelmetLink {
    pub(crate) fn new(
        transport: Arc<dyn BleTransport>,
        min_write_interval: Duration,
        write_watchdog: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            state: LinkState::Idle,
            target: None,
            handle: None,
            characteristic: None,
            queue: OutboundQueue::default(),
            pacer: Pacer::new(min_write_interval),
            write_watchdog,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> LinkState {
        self.state
    }

    pub(crate) fn handle_command(&mut self, command: LinkCommand) {
        match command {
            LinkCommand::Start(request) => self.start(&request),
            LinkCommand::Send(payload) => self.send(payload),
            LinkCommand::Stop => self.stop(),
            LinkCommand::Status(reply) => {
                // the caller may have given up waiting
                let _ = reply.send(self.status());
            }
        }
    }

    pub(crate) fn status(&self) -> LinkStatus {
        LinkStatus {
            state: self.state,
            target: self.target.clone(),
            characteristic: self.characteristic.as_ref().map(WritableCharacteristicDto::from),
            queued: self.queue.len(),
            write_in_flight: self.pacer.is_busy(),
            last_write_at: self.pacer.last_write_wall(),
        }
    }
}
