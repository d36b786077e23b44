use btleplug::api::{Central, Peripheral as _, ScanFilter};
use btleplug::platform::Peripheral;
use futures_util::StreamExt;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::inner::error::{LinkError, LinkResult};
use crate::inner::transport::gatt::ext::CentralEventExt;
use crate::inner::transport::gatt::worker::ConnectionWorker;

/// `device_id` is either the peripheral address or its platform id as serialized by btleplug.
pub(super) fn matches_device(peripheral: &Peripheral, device_id: &str) -> bool {
    if peripheral.address().to_string().eq_ignore_ascii_case(device_id) {
        return true;
    }

    let id = match serde_json::to_value(peripheral.id()) {
        Ok(id) => id,
        Err(err) => {
            warn!(?err, "Failed to serialize peripheral id");
            return false;
        }
    };
    peripheral_id_string(&id).is_some_and(|id| id.eq_ignore_ascii_case(device_id))
}

fn peripheral_id_string(value: &serde_json::Value) -> Option<&str> {
    match value {
        serde_json::Value::String(id) => Some(id),
        serde_json::Value::Object(fields) => fields.values().find_map(peripheral_id_string),
        _ => None,
    }
}

impl ConnectionWorker {
    pub(super) async fn resolve_peripheral(&self) -> LinkResult<Peripheral> {
        let device_id = self.handle.device_id.as_str();

        if let Some(peripheral) = self.find_known(device_id).await? {
            debug!("Peripheral already known to adapter");
            return Ok(peripheral);
        }

        info!(timeout = ?self.app_conf.peripheral_discovery_timeout, "Scanning for peripheral");
        let mut events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;

        let scan = async {
            while let Some(event) = events.next().await {
                let Some(id) = event.discovered_peripheral_id() else {
                    continue;
                };
                match self.adapter.peripheral(id).await {
                    Ok(peripheral) if matches_device(&peripheral, device_id) => {
                        return Ok(peripheral)
                    }
                    Ok(_) => {}
                    Err(err) => debug!(?err, "Discovered peripheral vanished"),
                }
            }
            Err(LinkError::EndOfStream)
        };
        let found = timeout(self.app_conf.peripheral_discovery_timeout, scan).await;

        if let Err(err) = self.adapter.stop_scan().await {
            warn!(?err, "Failed to stop scan");
        }

        match found {
            Ok(result) => result,
            Err(_) => Err(LinkError::PeripheralNotFound(device_id.to_string())),
        }
    }

    async fn find_known(&self, device_id: &str) -> LinkResult<Option<Peripheral>> {
        Ok(self
            .adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|peripheral| matches_device(peripheral, device_id)))
    }
}
