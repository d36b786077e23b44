use btleplug::api::CentralEvent;
use btleplug::platform::PeripheralId;

pub(super) trait CentralEventExt {
    fn discovered_peripheral_id(&self) -> Option<&PeripheralId>;

    fn disconnected_peripheral_id(&self) -> Option<&PeripheralId>;
}

impl CentralEventExt for CentralEvent {
    fn discovered_peripheral_id(&self) -> Option<&PeripheralId> {
        match self {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => Some(id),
            _ => None,
        }
    }

    fn disconnected_peripheral_id(&self) -> Option<&PeripheralId> {
        match self {
            CentralEvent::DeviceDisconnected(id) => Some(id),
            _ => None,
        }
    }
}
