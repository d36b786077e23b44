use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::init::{init_link, init_prometheus, init_rocket, init_tracing};
use crate::inner::conf::cmd_args::AppConf;
use crate::inner::conf::dto::link_configuration::LinkConfigurationDto;
use crate::inner::transport::gatt::adapter::select_adapter;

mod init;
mod inner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let app_conf = Arc::new(AppConf::parse());
    let link_configuration = LinkConfigurationDto::try_from(app_conf.as_ref())?;
    info!(?app_conf, "Starting helmet link");

    let prometheus_handle = init_prometheus(app_conf.metrics_idle_timeout)?;
    let adapter = select_adapter(app_conf.adapter.as_deref()).await;

    let (link_handle, link_service) = init_link(adapter, &app_conf);

    let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();

    join_set.spawn(async move {
        link_service.run().await?;
        Ok(())
    });

    {
        let link_handle = link_handle.clone();
        let listen_address = app_conf.listen_address;
        join_set.spawn(async move {
            init_rocket(link_handle, prometheus_handle, listen_address)
                .launch()
                .await?;
            Ok(())
        });
    }

    if let Some(request) = link_configuration.autostart {
        info!(?request, "Starting configured link");
        link_handle.start(request).await?;
    }

    if let Some(result) = join_set.join_next().await {
        warn!(?result, "Ending everything");
    }

    Ok(())
}
