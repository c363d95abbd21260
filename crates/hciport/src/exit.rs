use std::fmt;
use std::io;

use hciport_frame::FrameError;
use hciport_router::RouterError;
use hciport_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const SETUP_FAILED: i32 = 3;
pub const WAIT_FAILED: i32 = 4;
pub const UNEXPECTED_DESCRIPTOR: i32 = 5;
pub const TRANSPORT_ERROR: i32 = 6;
pub const USAGE: i32 = 64;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
}

pub fn router_error(context: &str, err: RouterError) -> CliError {
    match err {
        RouterError::Setup(_) | RouterError::Membership(_) => {
            CliError::new(SETUP_FAILED, format!("{context}: {err}"))
        }
        RouterError::Wait(_) => CliError::new(WAIT_FAILED, format!("{context}: {err}")),
        RouterError::UnexpectedDescriptor(_) => {
            CliError::new(UNEXPECTED_DESCRIPTOR, format!("{context}: {err}"))
        }
        RouterError::Frame(err) => frame_error(context, err),
        RouterError::Hardware(err) => transport_error(context, err),
        RouterError::NoDevice(_) => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readiness(op: &'static str) -> TransportError {
        TransportError::Readiness {
            op,
            source: io::Error::from(io::ErrorKind::Other),
        }
    }

    #[test]
    fn fatal_router_errors_have_distinct_codes() {
        let codes = [
            router_error("x", RouterError::Setup(readiness("create"))).code,
            router_error("x", RouterError::Wait(readiness("wait"))).code,
            router_error("x", RouterError::UnexpectedDescriptor(7)).code,
            router_error("x", RouterError::Frame(FrameError::ConnectionClosed)).code,
        ];
        assert_eq!(
            codes,
            [SETUP_FAILED, WAIT_FAILED, UNEXPECTED_DESCRIPTOR, TRANSPORT_ERROR]
        );
        assert!(codes.iter().all(|code| *code != SUCCESS));
    }

    #[test]
    fn message_carries_context() {
        let err = router_error("router", RouterError::UnexpectedDescriptor(42));
        assert_eq!(err.to_string(), "router: unexpected descriptor token 42 in ready set");
    }
}
