use metrics_exporter_prometheus::PrometheusHandle;
use rocket::response::status::Accepted;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::inner::error::LinkError;
use crate::inner::http_error::{AcceptedResult, JsonResult};
use crate::inner::link::handle::LinkHandle;
use crate::inner::model::connection_target::StartRequestDto;
use crate::inner::model::link_command::SendRequestDto;
use crate::inner::model::link_status::LinkStatus;

#[post("/start", data = "<request>")]
pub(crate) async fn start(
    link: &State<LinkHandle>,
    request: Json<StartRequestDto>,
) -> AcceptedResult<LinkError> {
    link.start(request.into_inner()).await?;
    Ok(Accepted(()))
}

#[post("/send", data = "<request>")]
pub(crate) async fn send(
    link: &State<LinkHandle>,
    request: Json<SendRequestDto>,
) -> AcceptedResult<LinkError> {
    link.send(request.into_inner().payload).await?;
    Ok(Accepted(()))
}

#[post("/stop")]
pub(crate) async fn stop(link: &State<LinkHandle>) -> AcceptedResult<LinkError> {
    link.stop().await?;
    Ok(Accepted(()))
}

#[get("/status")]
pub(crate) async fn status(link: &State<LinkHandle>) -> JsonResult<LinkStatus, LinkError> {
    Ok(link.status().await?.into())
}

#[get("/metrics")]
pub(crate) async fn get_metrics(prometheus_handle: &State<PrometheusHandle>) -> String {
    prometheus_handle.render()
}
