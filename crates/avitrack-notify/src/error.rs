/// Errors raised while building or selecting notification adapters.
///
/// Delivery itself never raises; failures surface as
/// [`avitrack_common::types::DeliveryResult`] with FAILED status.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Adapter settings are missing a required field or contain an invalid
    /// value (e.g. an unparseable SMTP relay host).
    #[error("notify: invalid adapter configuration: {0}")]
    InvalidConfig(String),

    /// The requested adapter name is not registered.
    #[error("notify: unknown adapter '{0}'")]
    UnknownAdapter(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
