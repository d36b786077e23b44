use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::inner::conf::dto::link_configuration::LinkConfigurationDto;
use crate::inner::error::LinkError;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = r###"Smart helmet BLE link
"###
)]
pub(crate) struct AppConf {
    /// Optional YAML file with a target to connect to on startup.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Command intake listen address
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub(crate) listen_address: SocketAddr,

    /// Use the first adapter whose description contains this string
    #[arg(long)]
    pub(crate) adapter: Option<String>,

    /// Minimum spacing between the completion of one write and the next dispatch
    #[arg(long, value_parser = humantime::parse_duration, default_value = "1s")]
    pub(crate) min_write_interval: Duration,

    /// Peripheral connect timeout
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub(crate) peripheral_connect_timeout: Duration,

    /// How long to scan for a peripheral the adapter has not seen yet
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub(crate) peripheral_discovery_timeout: Duration,

    /// Characteristic write timeout
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
    pub(crate) write_timeout: Duration,

    /// Periodically retry dispatching queued payloads
    #[arg(long, value_parser = humantime::parse_duration)]
    pub(crate) redrive_interval: Option<Duration>,

    /// Abandon a write that has not been acknowledged within this time (checked on redrive)
    #[arg(long, value_parser = humantime::parse_duration, requires = "redrive_interval")]
    pub(crate) write_watchdog: Option<Duration>,

    /// Drop idle metrics after this time
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10m")]
    pub(crate) metrics_idle_timeout: Duration,
}

impl TryFrom<&AppConf> for LinkConfigurationDto {
    type Error = LinkError;

    fn try_from(value: &AppConf) -> Result<Self, Self::Error> {
        let Some(path) = value.config.as_ref() else {
            return Ok(Self::default());
        };
        let config = std::fs::read_to_string(path)?;
        let config: LinkConfigurationDto = serde_yaml::from_str(&config)?;
        Ok(config)
    }
}
