/// Errors that can occur in descriptor-level transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open a descriptor (socket, epoll instance, stdio duplicate).
    #[error("failed to open {what}: {source}")]
    Open {
        what: &'static str,
        source: std::io::Error,
    },

    /// Failed to bind the HCI socket to a device.
    #[error("failed to bind hci device {dev_id}: {source}")]
    Bind {
        dev_id: u16,
        source: std::io::Error,
    },

    /// An HCI ioctl or socket option call failed.
    #[error("hci {request} failed: {source}")]
    Ioctl {
        request: &'static str,
        source: std::io::Error,
    },

    /// Adding, removing, or waiting on the readiness set failed.
    #[error("readiness {op} failed: {source}")]
    Readiness {
        op: &'static str,
        source: std::io::Error,
    },

    /// An I/O error occurred on a descriptor.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No HCI socket is currently open.
    #[error("hci socket not open")]
    NotOpen,
}

impl TransportError {
    /// The underlying OS error, if this error carries one.
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            TransportError::Open { source, .. }
            | TransportError::Bind { source, .. }
            | TransportError::Ioctl { source, .. }
            | TransportError::Readiness { source, .. }
            | TransportError::Io(source) => Some(source),
            TransportError::NotOpen => None,
        }
    }

    /// Platform description of the failure, without the `(os error N)` suffix.
    pub fn reason(&self) -> String {
        match self.io_error() {
            Some(err) => os_reason(err),
            None => self.to_string(),
        }
    }
}

/// Render an I/O error the way the platform names it.
pub fn os_reason(err: &std::io::Error) -> String {
    let text = err.to_string();
    match text.find(" (os error") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
