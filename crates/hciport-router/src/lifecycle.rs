use std::os::fd::{AsRawFd, RawFd};

use hciport_transport::{BdAddr, HciDevice, HciOpener, TransportError};
use tracing::{debug, info};

use crate::error::{Result, RouterError};

/// What the hardware channel currently exposes for readiness.
///
/// A handle is present only while a socket is both open and bound. The
/// generation advances every time the handle appears or disappears, so a
/// reopened socket that reuses the previous descriptor number still compares
/// unequal to the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Absent,
    Present { fd: RawFd, generation: u64 },
}

/// Controller the socket is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDevice {
    pub dev_id: u16,
    pub name: String,
    pub address: BdAddr,
}

/// The single hardware connection: closed, open, or open and bound.
pub struct HardwareChannel<O: HciOpener> {
    opener: O,
    socket: Option<O::Device>,
    bound: Option<BoundDevice>,
    generation: u64,
}

impl<O: HciOpener> HardwareChannel<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            socket: None,
            bound: None,
            generation: 0,
        }
    }

    /// Current readiness handle.
    pub fn handle(&self) -> Handle {
        match (&self.socket, &self.bound) {
            (Some(socket), Some(_)) => Handle::Present {
                fd: socket.as_raw_fd(),
                generation: self.generation,
            },
            _ => Handle::Absent,
        }
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    pub fn bound_device(&self) -> Option<&BoundDevice> {
        self.bound.as_ref()
    }

    /// Open a fresh socket, closing any existing one first.
    pub fn open(&mut self) -> Result<()> {
        if self.socket.is_some() {
            debug!("reopening hci socket");
            self.close();
        }
        let socket = self.opener.open()?;
        info!(fd = socket.as_raw_fd(), "hci socket opened");
        self.socket = Some(socket);
        Ok(())
    }

    /// Release the socket. Closing a closed channel is a no-op.
    pub fn close(&mut self) {
        if self.bound.take().is_some() {
            self.generation += 1;
        }
        if let Some(socket) = self.socket.take() {
            info!(fd = socket.as_raw_fd(), "hci socket closed");
        }
    }

    /// Whether the bound controller reports itself up.
    ///
    /// An unbound channel is never up.
    pub fn is_dev_up(&self) -> Result<bool> {
        match (&self.socket, &self.bound) {
            (Some(socket), Some(bound)) => Ok(socket.device_info(bound.dev_id)?.is_up()),
            _ => Ok(false),
        }
    }

    /// First controller, in kernel order, whose up state equals `is_up`.
    ///
    /// Uses a short-lived socket when none is open.
    pub fn dev_id_for(&self, is_up: bool) -> Result<Option<u16>> {
        let devices = match &self.socket {
            Some(socket) => socket.device_list()?,
            None => self.opener.open()?.device_list()?,
        };
        Ok(devices
            .into_iter()
            .find(|status| status.up == is_up)
            .map(|status| status.dev_id))
    }

    /// Bind to `dev_id`, or to the first up controller when `None`.
    ///
    /// A socket that is already bound is replaced by a fresh one first.
    pub fn bind_raw(&mut self, dev_id: Option<u16>) -> Result<u16> {
        let dev_id = match dev_id {
            Some(dev_id) => dev_id,
            None => self
                .dev_id_for(true)?
                .ok_or(RouterError::NoDevice("up"))?,
        };

        if self.socket.is_none() || self.bound.is_some() {
            self.open()?;
        }
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;
        socket.bind_raw(dev_id)?;

        let bound = match socket.device_info(dev_id) {
            Ok(info) => BoundDevice {
                dev_id,
                name: info.name,
                address: info.address,
            },
            Err(err) => {
                debug!(dev_id, error = %err, "bound device info unavailable");
                BoundDevice {
                    dev_id,
                    name: String::new(),
                    address: BdAddr::default(),
                }
            }
        };
        info!(dev_id, address = %bound.address, name = %bound.name, "hci socket bound");
        self.bound = Some(bound);
        self.generation += 1;
        Ok(dev_id)
    }

    /// Write one raw packet to the controller.
    pub fn send(&self, data: &[u8]) -> Result<usize> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;
        Ok(socket.send(data)?)
    }

    /// Install a kernel event filter.
    pub fn set_filter(&self, filter: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;
        Ok(socket.set_filter(filter)?)
    }

    /// Read one pending packet without blocking.
    pub fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &self.socket {
            Some(socket) => socket.recv(buf),
            None => Err(std::io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl<O: HciOpener> std::fmt::Debug for HardwareChannel<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareChannel")
            .field("handle", &self.handle())
            .field("bound", &self.bound)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeOpener;

    #[test]
    fn starts_closed_and_absent() {
        let channel = HardwareChannel::new(FakeOpener::with_devices(&[(0, true)]));
        assert!(!channel.is_open());
        assert_eq!(channel.handle(), Handle::Absent);
        assert!(!channel.is_dev_up().unwrap());
    }

    #[test]
    fn open_alone_does_not_expose_a_handle() {
        let mut channel = HardwareChannel::new(FakeOpener::with_devices(&[(0, true)]));
        channel.open().unwrap();
        assert!(channel.is_open());
        assert_eq!(channel.handle(), Handle::Absent);
    }

    #[test]
    fn open_twice_replaces_the_socket() {
        let opener = FakeOpener::with_devices(&[(0, true)]);
        let mut channel = HardwareChannel::new(opener.clone());
        channel.open().unwrap();
        channel.open().unwrap();
        assert_eq!(opener.opened(), 2);
        assert_eq!(opener.live(), 1);
    }

    #[test]
    fn bind_explicit_device() {
        let opener = FakeOpener::with_devices(&[(0, false), (1, true)]);
        let mut channel = HardwareChannel::new(opener);
        channel.open().unwrap();

        assert_eq!(channel.bind_raw(Some(1)).unwrap(), 1);
        assert!(matches!(channel.handle(), Handle::Present { .. }));
        let bound = channel.bound_device().unwrap();
        assert_eq!(bound.dev_id, 1);
        assert_eq!(bound.name, "hci1");
        assert!(channel.is_dev_up().unwrap());
    }

    #[test]
    fn bind_without_prior_open_opens_a_socket() {
        let opener = FakeOpener::with_devices(&[(0, true)]);
        let mut channel = HardwareChannel::new(opener.clone());
        assert_eq!(channel.bind_raw(Some(0)).unwrap(), 0);
        assert!(channel.is_open());
        assert_eq!(opener.live(), 1);
    }

    #[test]
    fn bind_none_picks_first_up_device() {
        let opener = FakeOpener::with_devices(&[(0, false), (3, true), (5, true)]);
        let mut channel = HardwareChannel::new(opener);
        assert_eq!(channel.bind_raw(None).unwrap(), 3);
    }

    #[test]
    fn bind_none_without_up_device_fails() {
        let opener = FakeOpener::with_devices(&[(0, false)]);
        let mut channel = HardwareChannel::new(opener);
        let err = channel.bind_raw(None).unwrap_err();
        assert!(matches!(err, RouterError::NoDevice("up")));
        assert_eq!(channel.handle(), Handle::Absent);
    }

    #[test]
    fn failed_bind_leaves_socket_open_and_unbound() {
        let opener = FakeOpener::with_devices(&[(0, true)]);
        let mut channel = HardwareChannel::new(opener);
        channel.open().unwrap();
        let err = channel.bind_raw(Some(9)).unwrap_err();
        assert!(matches!(
            err,
            RouterError::Hardware(TransportError::Bind { dev_id: 9, .. })
        ));
        assert!(channel.is_open());
        assert_eq!(channel.handle(), Handle::Absent);
    }

    #[test]
    fn rebind_changes_generation() {
        let opener = FakeOpener::with_devices(&[(0, true), (1, true)]);
        let mut channel = HardwareChannel::new(opener.clone());
        channel.bind_raw(Some(0)).unwrap();
        let first = channel.handle();

        channel.bind_raw(Some(1)).unwrap();
        let second = channel.handle();

        assert_ne!(first, second);
        assert_eq!(opener.live(), 1);
        assert_eq!(channel.bound_device().unwrap().dev_id, 1);
    }

    #[test]
    fn close_is_idempotent_and_clears_handle() {
        let mut channel = HardwareChannel::new(FakeOpener::with_devices(&[(0, true)]));
        channel.bind_raw(Some(0)).unwrap();
        channel.close();
        channel.close();
        assert!(!channel.is_open());
        assert_eq!(channel.handle(), Handle::Absent);
        assert!(channel.bound_device().is_none());
    }

    #[test]
    fn dev_id_for_uses_temporary_socket_when_closed() {
        let opener = FakeOpener::with_devices(&[(0, true), (1, false)]);
        let channel = HardwareChannel::new(opener.clone());

        assert_eq!(channel.dev_id_for(false).unwrap(), Some(1));
        assert_eq!(channel.dev_id_for(true).unwrap(), Some(0));
        assert_eq!(opener.opened(), 2);
        assert_eq!(opener.live(), 0);
        assert!(!channel.is_open());
    }

    #[test]
    fn dev_id_for_no_match() {
        let channel = HardwareChannel::new(FakeOpener::with_devices(&[(0, true)]));
        assert_eq!(channel.dev_id_for(false).unwrap(), None);
    }

    #[test]
    fn send_and_filter_require_open_socket() {
        let channel = HardwareChannel::new(FakeOpener::with_devices(&[]));
        assert!(matches!(
            channel.send(&[1, 3, 12, 0]).unwrap_err(),
            RouterError::Hardware(TransportError::NotOpen)
        ));
        assert!(matches!(
            channel.set_filter(&[0; 14]).unwrap_err(),
            RouterError::Hardware(TransportError::NotOpen)
        ));
        let mut buf = [0u8; 8];
        assert_eq!(
            channel.recv(&mut buf).unwrap_err().kind(),
            std::io::ErrorKind::WouldBlock
        );
    }

    #[test]
    fn send_reaches_the_device() {
        let opener = FakeOpener::with_devices(&[(0, true)]);
        let mut channel = HardwareChannel::new(opener.clone());
        channel.open().unwrap();
        assert_eq!(channel.send(&[1, 3, 12, 0]).unwrap(), 4);
        channel.set_filter(&[0x10; 14]).unwrap();

        assert_eq!(opener.sent(), vec![vec![1, 3, 12, 0]]);
        assert_eq!(opener.filters(), vec![vec![0x10; 14]]);
    }
}
