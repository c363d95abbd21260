use std::fs::File;
use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use tracing::debug;

use crate::error::{Result, TransportError};

/// The control channel: request frames arrive on `input`, replies and events
/// leave on `output`.
#[derive(Debug)]
pub struct ControlChannel {
    input: File,
    output: File,
}

impl ControlChannel {
    /// Take over the process's standard input and output.
    ///
    /// Both descriptors are duplicated, then descriptor 1 is pointed at
    /// stderr: stray writes to stdout would corrupt the peer's framing.
    pub fn stdio() -> Result<Self> {
        let input = io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|source| TransportError::Open {
                what: "stdin duplicate",
                source,
            })?;
        let output = io::stdout()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|source| TransportError::Open {
                what: "stdout duplicate",
                source,
            })?;

        // SAFETY: dup2 on two descriptors this process holds open; no memory is shared.
        let rc = unsafe { libc::dup2(libc::STDERR_FILENO, libc::STDOUT_FILENO) };
        if rc < 0 {
            return Err(TransportError::Open {
                what: "stdout redirect",
                source: io::Error::last_os_error(),
            });
        }

        debug!(
            input = input.as_raw_fd(),
            output = output.as_raw_fd(),
            "control channel attached to stdio"
        );
        Ok(Self::from_parts(input, output))
    }

    /// Build a control channel from arbitrary descriptors (pipes, socket pairs).
    pub fn from_parts(input: impl Into<OwnedFd>, output: impl Into<OwnedFd>) -> Self {
        Self {
            input: File::from(input.into()),
            output: File::from(output.into()),
        }
    }

    /// Split into the readable and writable halves.
    pub fn into_split(self) -> (File, File) {
        (self.input, self.output)
    }
}
