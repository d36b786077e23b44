use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use btleplug::platform::Adapter;
use console_subscriber::ConsoleLayer;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use metrics_tracing_context::{MetricsLayer, TracingContextLayer};
use metrics_util::layers::Stack;
use metrics_util::MetricKindMask;
use rocket::{routes, Build, Rocket};
use tracing::info_span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::inner::api::{get_metrics, send, start, status, stop};
use crate::inner::conf::cmd_args::AppConf;
use crate::inner::link::handle::{link_channel, LinkHandle};
use crate::inner::link::service::LinkService;
use crate::inner::link::HelmetLink;
use crate::inner::metrics::describe_metrics;
use crate::inner::transport::gatt::GattTransport;

pub(super) fn init_tracing() -> anyhow::Result<()> {
    let metrics_layer = MetricsLayer::new();
    let console_layer = ConsoleLayer::builder().with_default_env().spawn();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_target(false);
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(metrics_layer)
        .with(console_layer)
        .init();

    Ok(())
}

pub(super) fn init_prometheus(idle_timeout: Duration) -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();
    let (recorder, exporter) = builder
        .idle_timeout(
            MetricKindMask::COUNTER | MetricKindMask::HISTOGRAM | MetricKindMask::GAUGE,
            Some(idle_timeout),
        )
        .build()?;

    let prometheus_handle = recorder.handle();

    Stack::new(recorder)
        .push(TracingContextLayer::only_allow(["device", "handle", "mode"]))
        .install()
        .map_err(|err| anyhow::anyhow!("Failed to install metrics recorder: {err}"))?;

    let handle = tokio::runtime::Handle::try_current()?;
    handle.spawn(exporter);

    describe_metrics();

    Ok(prometheus_handle)
}

pub(super) fn init_link(
    adapter: Option<Adapter>,
    app_conf: &Arc<AppConf>,
) -> (LinkHandle, LinkService) {
    let (event_sender, event_receiver) = kanal::unbounded_async();
    let transport = GattTransport::new(
        adapter,
        event_sender,
        Arc::clone(app_conf),
        info_span!("gatt_transport"),
    );
    let link = HelmetLink::new(
        Arc::new(transport),
        app_conf.min_write_interval,
        app_conf.write_watchdog,
    );

    let (link_handle, command_receiver) = link_channel();
    let service = LinkService::new(
        link,
        command_receiver,
        event_receiver,
        app_conf.redrive_interval,
    );

    (link_handle, service)
}

pub(super) fn init_rocket(
    link_handle: LinkHandle,
    prometheus_handle: PrometheusHandle,
    listen_address: SocketAddr,
) -> Rocket<Build> {
    rocket::build()
        .manage(link_handle)
        .manage(prometheus_handle)
        .mount("/helmet", routes![start, send, stop, status])
        .mount("/", routes![get_metrics])
        .configure(
            rocket::config::Config::figment()
                .merge(("address", Arc::new(listen_address.ip().to_string())))
                .merge(("port", listen_address.port())),
        )
}
