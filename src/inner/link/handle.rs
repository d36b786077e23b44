use kanal::{AsyncReceiver, AsyncSender};
use tokio::sync::oneshot;

use crate::inner::error::LinkResult;
use crate::inner::model::connection_target::StartRequestDto;
use crate::inner::model::link_command::LinkCommand;
use crate::inner::model::link_status::LinkStatus;

/// Command intake. Start, send and stop return as soon as the command is queued.
#[derive(Clone)]
pub(crate) struct LinkHandle {
    sender: AsyncSender<LinkCommand>,
}

pub(crate) fn link_channel() -> (LinkHandle, AsyncReceiver<LinkCommand>) {
    let (sender, receiver) = kanal::unbounded_async();
    (LinkHandle { sender }, receiver)
}

impl LinkHandle {
    pub(crate) async fn start(&self, request: StartRequestDto) -> LinkResult<()> {
        self.sender.send(LinkCommand::Start(request)).await?;
        Ok(())
    }

    pub(crate) async fn send(&self, payload: Option<String>) -> LinkResult<()> {
        self.sender.send(LinkCommand::Send(payload)).await?;
        Ok(())
    }

    pub(crate) async fn stop(&self) -> LinkResult<()> {
        self.sender.send(LinkCommand::Stop).await?;
        Ok(())
    }

    pub(crate) async fn status(&self) -> LinkResult<LinkStatus> {
        let (reply, receiver) = oneshot::channel();
        self.sender.send(LinkCommand::Status(reply)).await?;
        Ok(receiver.await?)
    }
}
