use crate::inner::model::connection_handle::HandleId;

#[derive(Debug, thiserror::Error)]
pub(crate) enum LinkError {
    #[error("Bluetooth error: {0:?}")]
    BluetoothError(#[from] btleplug::Error),

    #[error("Invalid {field} UUID {value:?}: {source}")]
    InvalidUuid {
        field: &'static str,
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("Device id is empty")]
    EmptyDeviceId,

    #[error("No bluetooth adapter available")]
    AdapterUnavailable,

    #[error("Peripheral {0} not found")]
    PeripheralNotFound(String),

    #[error("Unknown connection handle {0}")]
    UnknownHandle(HandleId),

    #[error("Connection {0} is closed")]
    ConnectionClosed(HandleId),

    #[error("Kanal send error: {0:?}")]
    KanalSendError(#[from] kanal::SendError),

    #[error("Kanal receive error: {0:?}")]
    KanalReceiveError(#[from] kanal::ReceiveError),

    #[error("Status reply dropped")]
    StatusUnavailable(#[from] tokio::sync::oneshot::error::RecvError),

    #[error("Timeout: {0:?}")]
    TimeoutError(#[from] tokio::time::error::Elapsed),

    #[error("End of stream")]
    EndOfStream,

    #[error("IoError: {0:?}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization Error: {0:?}")]
    SerializationError(#[from] serde_yaml::Error),
}

pub(crate) type LinkResult<T> = Result<T, LinkError>;
