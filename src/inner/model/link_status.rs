use btleplug::api::{CharPropFlags, Characteristic};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::inner::model::connection_target::ConnectionTarget;
use crate::inner::model::link_state::LinkState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WritableCharacteristicDto {
    pub(crate) uuid: Uuid,
    pub(crate) service_uuid: Uuid,
    pub(crate) write_with_response: bool,
    pub(crate) write_without_response: bool,
}

impl From<&Characteristic> for WritableCharacteristicDto {
    fn from(value: &Characteristic) -> Self {
        Self {
            uuid: value.uuid,
            service_uuid: value.service_uuid,
            write_with_response: value.properties.contains(CharPropFlags::WRITE),
            write_without_response: value
                .properties
                .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LinkStatus {
    pub(crate) state: LinkState,
    pub(crate) target: Option<ConnectionTarget>,
    pub(crate) characteristic: Option<WritableCharacteristicDto>,
    pub(crate) queued: usize,
    pub(crate) write_in_flight: bool,
    pub(crate) last_write_at: Option<DateTime<Utc>>,
}
