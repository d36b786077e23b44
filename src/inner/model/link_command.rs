use serde::Deserialize;
use tokio::sync::oneshot;

use crate::inner::model::connection_target::StartRequestDto;
use crate::inner::model::link_status::LinkStatus;

#[derive(Debug)]
pub(crate) enum LinkCommand {
    Start(StartRequestDto),
    Send(Option<String>),
    Stop,
    Status(oneshot::Sender<LinkStatus>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SendRequestDto {
    #[serde(default)]
    pub(crate) payload: Option<String>,
}

/// Wire framing of a text payload: the device reads newline-terminated lines.
pub(crate) fn frame_payload(payload: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 1);
    bytes.extend_from_slice(payload.as_bytes());
    bytes.push(b'\n');
    bytes
}
