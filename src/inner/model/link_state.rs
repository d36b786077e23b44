use serde::Serialize;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
pub(crate) enum LinkState {
    #[default]
    Idle,
    Connecting,
    DiscoveringServices,
    Ready,
}
