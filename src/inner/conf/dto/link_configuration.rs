use serde::{Deserialize, Serialize};

use crate::inner::model::connection_target::StartRequestDto;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub(crate) struct LinkConfigurationDto {
    /// Issued as a Start command once the link service is running.
    #[serde(default)]
    pub(crate) autostart: Option<StartRequestDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_example() {
        let example = include_str!("../../../../helmet.example.yaml");
        let deserialized: LinkConfigurationDto = serde_yaml::from_str(example).unwrap();
        let autostart = deserialized.autostart.unwrap();
        assert_eq!(autostart.device_id.as_deref(), Some("24:6F:28:AA:10:3E"));
        assert_eq!(autostart.service_uuid, "4fafc201-1fb5-459e-8fcc-c5c9c331914b");
    }

    #[test]
    fn empty_document() {
        let deserialized: LinkConfigurationDto = serde_yaml::from_str("{}").unwrap();
        assert_eq!(deserialized, LinkConfigurationDto::default());
    }
}
