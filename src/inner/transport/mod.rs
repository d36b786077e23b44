use btleplug::api::{Characteristic, WriteType};

use crate::inner::error::LinkResult;
use crate::inner::model::connection_handle::ConnectionHandle;
use crate::inner::model::transport_event::WriteId;

pub(crate) mod gatt;
#[cfg(test)]
pub(crate) mod recording;

/// Capabilities the link needs from a BLE stack.
///
/// Every method only initiates an operation and returns immediately. Outcomes are
/// reported later as [`TransportEvent`](crate::inner::model::transport_event::TransportEvent)s
/// tagged with the handle id.
pub(crate) trait BleTransport: Send + Sync {
    fn connect(&self, device_id: &str) -> LinkResult<ConnectionHandle>;

    fn discover_services(&self, handle: &ConnectionHandle) -> LinkResult<()>;

    /// `Ok` means the write was accepted for dispatch. Only
    /// [`WriteType::WithResponse`] writes produce a completion event, carrying `write`.
    fn write_characteristic(
        &self,
        handle: &ConnectionHandle,
        write: WriteId,
        characteristic: &Characteristic,
        payload: &[u8],
        write_type: WriteType,
    ) -> LinkResult<()>;

    fn disconnect(&self, handle: &ConnectionHandle) -> LinkResult<()>;

    fn release(&self, handle: ConnectionHandle);
}
