//! Readiness multiplexing over epoll.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{Result, TransportError};

/// Notification style for a registered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Reported on every wait while data is pending.
    Level,
    /// Reported once per arrival; the owner must drain until `WouldBlock`.
    Edge,
}

/// A set of descriptors watched for readability, each tagged with a token.
pub struct Readiness {
    epfd: OwnedFd,
    events: Vec<libc::epoll_event>,
}

impl Readiness {
    /// Create an empty set that reports at most `max_events` descriptors per wait.
    pub fn new(max_events: usize) -> Result<Self> {
        // SAFETY: epoll_create1 takes no pointers; the result is checked before use.
        let raw = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if raw < 0 {
            return Err(TransportError::Open {
                what: "epoll instance",
                source: io::Error::last_os_error(),
            });
        }

        // SAFETY: `raw` is a freshly created descriptor not owned by anything else.
        let epfd = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Self {
            epfd,
            events: vec![libc::epoll_event { events: 0, u64: 0 }; max_events.max(1)],
        })
    }

    /// Watch `fd` for readability. Registering an already-present descriptor
    /// updates its token and trigger instead of failing.
    pub fn add(&self, fd: RawFd, token: u64, trigger: Trigger) -> Result<()> {
        let mut flags = libc::EPOLLIN as u32;
        if trigger == Trigger::Edge {
            flags |= libc::EPOLLET as u32;
        }
        let mut event = libc::epoll_event {
            events: flags,
            u64: token,
        };

        match self.ctl(libc::EPOLL_CTL_ADD, fd, &mut event) {
            Err(err) if err.raw_os_error() == Some(libc::EEXIST) => {
                self.ctl(libc::EPOLL_CTL_MOD, fd, &mut event)
                    .map_err(|source| TransportError::Readiness { op: "modify", source })?;
            }
            Err(source) => return Err(TransportError::Readiness { op: "add", source }),
            Ok(()) => {}
        }
        debug!(fd, token, ?trigger, "descriptor added to readiness set");
        Ok(())
    }

    /// Stop watching `fd`. A descriptor that is no longer registered, or was
    /// already closed (which drops it from epoll implicitly), is not an error.
    pub fn remove(&self, fd: RawFd) -> Result<()> {
        let mut event = libc::epoll_event { events: 0, u64: 0 };
        match self.ctl(libc::EPOLL_CTL_DEL, fd, &mut event) {
            Ok(()) => {}
            Err(err) if matches!(err.raw_os_error(), Some(libc::ENOENT) | Some(libc::EBADF)) => {
                trace!(fd, "descriptor already gone from readiness set");
            }
            Err(source) => return Err(TransportError::Readiness { op: "remove", source }),
        }
        debug!(fd, "descriptor removed from readiness set");
        Ok(())
    }

    /// Block until at least one descriptor is ready, or `timeout` elapses.
    ///
    /// Returns the tokens of the ready descriptors; an empty batch means the
    /// timeout expired. Signal interruptions are retried.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<Vec<u64>> {
        let timeout_ms = match timeout {
            Some(t) => t.as_millis().min(i32::MAX as u128) as libc::c_int,
            None => -1,
        };

        loop {
            // SAFETY: `events` is a live buffer of `events.len()` epoll_event entries.
            let n = unsafe {
                libc::epoll_wait(
                    self.epfd.as_raw_fd(),
                    self.events.as_mut_ptr(),
                    self.events.len() as libc::c_int,
                    timeout_ms,
                )
            };
            if n >= 0 {
                let ready = self.events[..n as usize]
                    .iter()
                    .map(|event| event.u64)
                    .collect::<Vec<_>>();
                trace!(?ready, "readiness wait returned");
                return Ok(ready);
            }

            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(TransportError::Readiness {
                    op: "wait",
                    source: err,
                });
            }
        }
    }

    fn ctl(&self, op: libc::c_int, fd: RawFd, event: &mut libc::epoll_event) -> io::Result<()> {
        // SAFETY: `event` is a valid epoll_event for the duration of the call.
        let rc = unsafe { libc::epoll_ctl(self.epfd.as_raw_fd(), op, fd, event) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl std::fmt::Debug for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readiness")
            .field("epfd", &self.epfd.as_raw_fd())
            .field("max_events", &self.events.len())
            .finish()
    }
}
