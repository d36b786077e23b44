pub(crate) mod connection_handle;
pub(crate) mod connection_target;
pub(crate) mod link_command;
pub(crate) mod link_state;
pub(crate) mod link_status;
pub(crate) mod transport_event;
