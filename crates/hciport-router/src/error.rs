use hciport_frame::FrameError;
use hciport_transport::TransportError;

/// Errors that can occur while routing requests and hardware events.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The readiness set could not be created, or the control channel
    /// could not be registered in it.
    #[error("readiness set setup failed: {0}")]
    Setup(#[source] TransportError),

    /// Waiting on the readiness set failed.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] TransportError),

    /// Adding or removing the hardware descriptor failed.
    #[error("readiness membership update failed: {0}")]
    Membership(#[source] TransportError),

    /// The readiness set reported a token outside the fixed membership.
    #[error("unexpected descriptor token {0} in ready set")]
    UnexpectedDescriptor(u64),

    /// Reading or writing the control channel failed.
    #[error("control channel error: {0}")]
    Frame(#[from] FrameError),

    /// A hardware operation failed.
    #[error("hardware channel error: {0}")]
    Hardware(#[from] TransportError),

    /// Device discovery found no controller in the requested state.
    #[error("no hci device is {0}")]
    NoDevice(&'static str),
}

impl RouterError {
    /// Failure text suitable for an error atom.
    pub fn reason(&self) -> String {
        match self {
            RouterError::Hardware(err) => err.reason(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
