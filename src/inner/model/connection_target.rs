use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inner::error::LinkError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartRequestDto {
    pub(crate) device_id: Option<String>,
    pub(crate) service_uuid: String,
    pub(crate) characteristic_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionTarget {
    pub(crate) device_id: Arc<String>,
    pub(crate) service_uuid: Uuid,
    pub(crate) characteristic_uuid: Uuid,
}

impl Display for ConnectionTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}::{}:{}",
            self.device_id, self.service_uuid, self.characteristic_uuid
        )
    }
}

fn parse_uuid(field: &'static str, value: &str) -> Result<Uuid, LinkError> {
    Uuid::parse_str(value.trim()).map_err(|source| LinkError::InvalidUuid {
        field,
        value: value.to_string(),
        source,
    })
}

impl TryFrom<&StartRequestDto> for ConnectionTarget {
    type Error = LinkError;

    fn try_from(value: &StartRequestDto) -> Result<Self, Self::Error> {
        let service_uuid = parse_uuid("service", &value.service_uuid)?;
        let characteristic_uuid = parse_uuid("characteristic", &value.characteristic_uuid)?;

        let device_id = value
            .device_id
            .as_deref()
            .map(str::trim)
            .filter(|device_id| !device_id.is_empty())
            .ok_or(LinkError::EmptyDeviceId)?;

        Ok(Self {
            device_id: Arc::new(device_id.to_string()),
            service_uuid,
            characteristic_uuid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(device_id: Option<&str>, service: &str, characteristic: &str) -> StartRequestDto {
        StartRequestDto {
            device_id: device_id.map(str::to_string),
            service_uuid: service.to_string(),
            characteristic_uuid: characteristic.to_string(),
        }
    }

    #[test]
    fn parses_hyphenated_uuids() {
        let target = ConnectionTarget::try_from(&request(
            Some("AA:BB:CC:DD:EE:FF"),
            "4fafc201-1fb5-459e-8fcc-c5c9c331914b",
            "BEB5483E-36E1-4688-B7F5-EA07361B26A8",
        ))
        .unwrap();

        assert_eq!(target.device_id.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            target.characteristic_uuid,
            Uuid::parse_str("beb5483e-36e1-4688-b7f5-ea07361b26a8").unwrap()
        );
    }

    #[test]
    fn rejects_malformed_service_uuid() {
        let err = ConnectionTarget::try_from(&request(
            Some("AA:BB:CC:DD:EE:FF"),
            "not-a-uuid",
            "beb5483e-36e1-4688-b7f5-ea07361b26a8",
        ))
        .unwrap_err();

        assert!(matches!(err, LinkError::InvalidUuid { field: "service", .. }));
    }

    #[test]
    fn uuids_are_checked_before_device_id() {
        let dto = request(None, "4fafc201-1fb5-459e-8fcc-c5c9c331914b", "zzz");
        let err = ConnectionTarget::try_from(&dto).unwrap_err();
        assert!(matches!(err, LinkError::InvalidUuid { field: "characteristic", .. }));
    }

    #[test]
    fn rejects_blank_device_id() {
        let err = ConnectionTarget::try_from(&request(
            Some("  "),
            "4fafc201-1fb5-459e-8fcc-c5c9c331914b",
            "beb5483e-36e1-4688-b7f5-ea07361b26a8",
        ))
        .unwrap_err();

        assert!(matches!(err, LinkError::EmptyDeviceId));
    }
}
