use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    #[error("transport io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out waiting for localization")]
    Timeout,
    #[error("transport disconnected")]
    Disconnected,
    #[error("robot rejected command: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PathError {
    #[error("failed to read path file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed path file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("popped waypoint from an empty queue")]
    EmptyQueue,
    #[error("waypoint queue was already loaded")]
    QueueAlreadyLoaded,
    #[error("malformed localization sample: {0}")]
    MalformedSample(String),
    #[error("failed to fetch localization")]
    Fetch(#[source] TransportError),
}
