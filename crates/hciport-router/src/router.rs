use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;

use hciport_frame::{FrameError, FrameReader, FrameWriter};
use hciport_term::{decode_request, encode_event, encode_reply, RequestError, Term};
use hciport_transport::{HciOpener, Readiness, Trigger};
use tracing::{debug, error, info, trace, warn};

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::lifecycle::{Handle, HardwareChannel};
use crate::registry;

/// Readiness token of the control input.
pub const CONTROL_TOKEN: u64 = 0;
/// Readiness token of the bound hardware socket.
pub const HARDWARE_TOKEN: u64 = 1;

/// Why the router stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The control input reached end-of-stream.
    EndOfInput,
}

/// Single-threaded loop multiplexing the control channel and the hardware
/// socket.
///
/// Control input is level-triggered and consumed one frame per readiness
/// report. The hardware socket is edge-triggered and drained completely on
/// each report. Within one ready batch hardware is handled first, so events
/// already queued by the controller are written before the next reply.
pub struct Router<R, W, O: HciOpener> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    channel: HardwareChannel<O>,
    readiness: Readiness,
    registered: Handle,
    config: RouterConfig,
    read_buf: Vec<u8>,
}

impl<R, W, O> Router<R, W, O>
where
    R: Read + AsRawFd,
    W: Write,
    O: HciOpener,
{
    /// Create the readiness set and register the control input.
    pub fn new(input: R, output: W, opener: O, config: RouterConfig) -> Result<Self> {
        let readiness = Readiness::new(config.max_events).map_err(RouterError::Setup)?;
        readiness
            .add(input.as_raw_fd(), CONTROL_TOKEN, Trigger::Level)
            .map_err(RouterError::Setup)?;
        debug!(fd = input.as_raw_fd(), "control channel registered");

        Ok(Self {
            reader: FrameReader::with_config(input, config.frame.clone()),
            writer: FrameWriter::with_config(output, config.frame.clone()),
            channel: HardwareChannel::new(opener),
            readiness,
            registered: Handle::Absent,
            read_buf: vec![0u8; config.hci_read_buffer.max(1)],
            config,
        })
    }

    /// Run until the control input ends or a fatal error occurs.
    pub fn run(mut self) -> Result<Shutdown> {
        info!("router started");
        loop {
            if let Some(shutdown) = self.turn()? {
                info!(reason = ?shutdown, "router stopped");
                return Ok(shutdown);
            }
        }
    }

    /// One iteration: reconcile membership, wait, handle the ready batch.
    ///
    /// A wait that times out returns `Ok(None)` having done nothing.
    pub fn turn(&mut self) -> Result<Option<Shutdown>> {
        self.reconcile()?;

        let mut ready = self
            .readiness
            .wait(self.config.wait_timeout)
            .map_err(RouterError::Wait)?;
        ready.sort_by_key(|token| *token != HARDWARE_TOKEN);
        trace!(?ready, "ready batch");

        for token in ready {
            match token {
                HARDWARE_TOKEN => self.drain_hardware()?,
                CONTROL_TOKEN => {
                    if let Some(shutdown) = self.process_control()? {
                        return Ok(Some(shutdown));
                    }
                }
                other => return Err(RouterError::UnexpectedDescriptor(other)),
            }
        }
        Ok(None)
    }

    /// Bring the readiness set in line with the hardware channel's handle.
    pub fn reconcile(&mut self) -> Result<()> {
        let desired = self.channel.handle();
        if desired == self.registered {
            return Ok(());
        }

        if let Handle::Present { fd, .. } = self.registered {
            self.readiness.remove(fd).map_err(RouterError::Membership)?;
            debug!(fd, "hardware socket unregistered");
        }
        self.registered = Handle::Absent;

        if let Handle::Present { fd, .. } = desired {
            self.readiness
                .add(fd, HARDWARE_TOKEN, Trigger::Edge)
                .map_err(RouterError::Membership)?;
            debug!(fd, "hardware socket registered");
        }
        self.registered = desired;
        Ok(())
    }

    /// Whether the hardware socket is currently in the readiness set.
    pub fn hardware_registered(&self) -> bool {
        matches!(self.registered, Handle::Present { .. })
    }

    pub fn channel(&self) -> &HardwareChannel<O> {
        &self.channel
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn drain_hardware(&mut self) -> Result<()> {
        let mut forwarded = 0usize;
        loop {
            match self.channel.recv(&mut self.read_buf) {
                Ok(0) => break,
                Ok(n) => {
                    let event = encode_event(&self.read_buf[..n]);
                    self.writer.send(&event)?;
                    forwarded += 1;
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "hardware read failed");
                    break;
                }
            }
        }
        trace!(forwarded, "hardware drained");
        Ok(())
    }

    fn process_control(&mut self) -> Result<Option<Shutdown>> {
        let payload = match self.reader.read_frame() {
            Ok(payload) => payload,
            Err(err) if err.is_end_of_input() => {
                match err {
                    FrameError::Truncated { .. } => warn!(error = %err, "control input closed"),
                    _ => info!("control input closed"),
                }
                return Ok(Some(Shutdown::EndOfInput));
            }
            Err(err) => return Err(err.into()),
        };

        let (correlation, result) = match decode_request(&payload) {
            Ok(request) => {
                let result = registry::handle(&request.body, &mut self.channel);
                debug!(request = ?request.body, result = ?result, "request handled");
                (request.correlation, result)
            }
            Err(RequestError::Body {
                correlation,
                source,
            }) => {
                warn!(len = payload.len(), error = %source, "undecodable request body");
                (correlation, Term::error("badarg"))
            }
            Err(err @ RequestError::Envelope(_)) => {
                warn!(len = payload.len(), error = %err, "dropping uncorrelated request");
                return Ok(None);
            }
        };

        let reply = encode_reply(&correlation, &result);
        match self.writer.send(&reply) {
            Err(FrameError::PayloadTooLarge { size, max }) => {
                error!(size, max, "reply exceeds frame limit, dropped");
                Ok(None)
            }
            other => other.map(|()| None).map_err(Into::into),
        }
    }
}

impl<R, W, O: HciOpener> std::fmt::Debug for Router<R, W, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("readiness", &self.readiness)
            .field("registered", &self.registered)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
