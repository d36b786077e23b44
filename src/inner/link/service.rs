use std::time::Duration;

use kanal::AsyncReceiver;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::info;

use crate::inner::error::LinkResult;
use crate::inner::link::HelmetLink;
use crate::inner::model::link_command::LinkCommand;
use crate::inner::model::transport_event::TransportEvent;

pub(crate) struct LinkService {
    link: HelmetLink,
    commands: AsyncReceiver<LinkCommand>,
    events: AsyncReceiver<TransportEvent>,
    redrive_interval: Option<Duration>,
}

impl LinkService {
    pub(crate) fn new(
        link: HelmetLink,
        commands: AsyncReceiver<LinkCommand>,
        events: AsyncReceiver<TransportEvent>,
        redrive_interval: Option<Duration>,
    ) -> Self {
        Self {
            link,
            commands,
            events,
            redrive_interval,
        }
    }

    /// Runs until the command intake or the transport goes away.
    #[tracing::instrument(level = "info", name = "link_service", skip_all, err)]
    pub(crate) async fn run(mut self) -> LinkResult<()> {
        info!(redrive_interval = ?self.redrive_interval, "Link service started");
        let mut redrive = self.redrive_interval.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                command = self.commands.recv() => self.link.handle_command(command?),
                event = self.events.recv() => self.link.handle_transport_event(event?),
                _ = next_tick(&mut redrive) => self.link.on_tick(),
            }
        }
    }
}

async fn next_tick(redrive: &mut Option<Interval>) {
    match redrive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use btleplug::api::{CharPropFlags, Characteristic, Service};
    use kanal::AsyncSender;
    use uuid::Uuid;

    use super::*;
    use crate::inner::error::LinkError;
    use crate::inner::link::handle::{link_channel, LinkHandle};
    use crate::inner::model::connection_handle::HandleId;
    use crate::inner::model::connection_target::StartRequestDto;
    use crate::inner::model::link_state::LinkState;
    use crate::inner::model::link_status::LinkStatus;
    use crate::inner::model::transport_event::{TransportEventKind, WriteId};
    use crate::inner::transport::recording::RecordingTransport;

    const SERVICE: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";
    const CHARACTERISTIC: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

    fn ready_services() -> BTreeSet<Service> {
        let service_uuid = Uuid::parse_str(SERVICE).unwrap();
        BTreeSet::from([Service {
            uuid: service_uuid,
            primary: true,
            characteristics: BTreeSet::from([Characteristic {
                uuid: Uuid::parse_str(CHARACTERISTIC).unwrap(),
                service_uuid,
                properties: CharPropFlags::WRITE,
                descriptors: BTreeSet::new(),
            }]),
        }])
    }

    fn spawn_service(
        transport: &Arc<RecordingTransport>,
        redrive_interval: Option<Duration>,
    ) -> (LinkHandle, AsyncSender<TransportEvent>, tokio::task::JoinHandle<LinkResult<()>>) {
        let link = HelmetLink::new(transport.clone(), Duration::from_secs(1), None);
        let (handle, commands) = link_channel();
        let (events, event_receiver) = kanal::unbounded_async();
        let service = LinkService::new(link, commands, event_receiver, redrive_interval);
        (handle, events, tokio::spawn(service.run()))
    }

    async fn wait_for(handle: &LinkHandle, predicate: impl Fn(&LinkStatus) -> bool) -> LinkStatus {
        for _ in 0..100 {
            let status = handle.status().await.unwrap();
            if predicate(&status) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("link never reached the expected status");
    }

    async fn connect_ready(handle: &LinkHandle, events: &AsyncSender<TransportEvent>) {
        handle
            .start(StartRequestDto {
                device_id: Some("24:6F:28:AA:10:3E".to_string()),
                service_uuid: SERVICE.to_string(),
                characteristic_uuid: CHARACTERISTIC.to_string(),
            })
            .await
            .unwrap();
        wait_for(handle, |status| status.state == LinkState::Connecting).await;

        events
            .send(TransportEvent::new(HandleId(1), TransportEventKind::Connected))
            .await
            .unwrap();
        events
            .send(TransportEvent::new(
                HandleId(1),
                TransportEventKind::ServicesDiscovered(ready_services()),
            ))
            .await
            .unwrap();
        wait_for(handle, |status| status.state == LinkState::Ready).await;
    }

    #[tokio::test(start_paused = true)]
    async fn redrive_delivers_payload_held_back_by_interval() {
        let transport = RecordingTransport::new();
        let redrive_interval = Some(Duration::from_millis(100));
        let (handle, events, _service) = spawn_service(&transport, redrive_interval);
        connect_ready(&handle, &events).await;

        handle.send(Some("a".to_string())).await.unwrap();
        handle.send(Some("b".to_string())).await.unwrap();
        wait_for(&handle, |status| status.write_in_flight && status.queued == 1).await;

        events
            .send(TransportEvent::new(
                HandleId(1),
                TransportEventKind::WriteCompleted {
                    write: WriteId(1),
                    success: true,
                },
            ))
            .await
            .unwrap();
        let status = wait_for(&handle, |status| !status.write_in_flight).await;
        assert_eq!(status.queued, 1);
        assert_eq!(transport.written_payloads(), vec![b"a\n".to_vec()]);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let status = wait_for(&handle, |status| status.queued == 0).await;
        assert!(status.write_in_flight);
        assert_eq!(transport.written_payloads(), vec![b"a\n".to_vec(), b"b\n".to_vec()]);
    }

    #[tokio::test(start_paused = true)]
    async fn without_redrive_timing_blocked_payload_waits_for_next_event() {
        let transport = RecordingTransport::new();
        let (handle, events, _service) = spawn_service(&transport, None);
        connect_ready(&handle, &events).await;

        handle.send(Some("a".to_string())).await.unwrap();
        handle.send(Some("b".to_string())).await.unwrap();
        events
            .send(TransportEvent::new(
                HandleId(1),
                TransportEventKind::WriteCompleted {
                    write: WriteId(1),
                    success: true,
                },
            ))
            .await
            .unwrap();
        wait_for(&handle, |status| !status.write_in_flight).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.queued, 1);
        assert_eq!(transport.written_payloads(), vec![b"a\n".to_vec()]);

        handle.send(Some("c".to_string())).await.unwrap();
        wait_for(&handle, |status| status.queued == 1 && status.write_in_flight).await;
        assert_eq!(transport.written_payloads(), vec![b"a\n".to_vec(), b"b\n".to_vec()]);
    }

    #[tokio::test]
    async fn stops_when_command_intake_is_dropped() {
        let transport = RecordingTransport::new();
        let (handle, _events, service) = spawn_service(&transport, None);
        drop(handle);

        let result = service.await.unwrap();
        assert!(matches!(result, Err(LinkError::KanalReceiveError(_))));
    }
}
