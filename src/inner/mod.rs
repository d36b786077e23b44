pub(crate) mod api;
pub(crate) mod conf;
pub(crate) mod error;
pub(crate) mod http_error;
pub(crate) mod link;
pub(crate) mod metrics;
pub(crate) mod model;
pub(crate) mod transport;
