//! In-memory controller backend for tests.
//!
//! Each opened socket is one end of a `UnixDatagram` pair; the other end is
//! kept so tests can inject packets the way a controller would.

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixDatagram;
use std::sync::{Arc, Mutex, MutexGuard};

use hciport_transport::{
    BdAddr, DeviceInfo, DeviceStatus, HciDevice, HciOpener, Result, TransportError,
};

#[derive(Default)]
struct FakeState {
    devices: Vec<DeviceInfo>,
    peers: Vec<UnixDatagram>,
    opened: usize,
    live: usize,
    sent: Vec<Vec<u8>>,
    filters: Vec<Vec<u8>>,
    fail_open: bool,
    fail_recv: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeOpener {
    state: Arc<Mutex<FakeState>>,
}

impl FakeOpener {
    /// Controllers as `(dev_id, up)` in enumeration order.
    pub(crate) fn with_devices(devices: &[(u16, bool)]) -> Self {
        let opener = Self::default();
        opener.lock().devices = devices
            .iter()
            .map(|&(dev_id, up)| DeviceInfo {
                dev_id,
                name: format!("hci{dev_id}"),
                address: BdAddr([dev_id as u8, 0, 0, 0xAD, 0xDE, 0x00]),
                flags: u32::from(up),
            })
            .collect();
        opener
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Make every socket read fail as if the controller went away.
    pub(crate) fn fail_recv(&self, fail: bool) {
        self.lock().fail_recv = fail;
    }

    /// Controller side of the most recently opened socket.
    pub(crate) fn peer(&self) -> UnixDatagram {
        self.lock()
            .peers
            .last()
            .expect("no socket opened")
            .try_clone()
            .unwrap()
    }

    pub(crate) fn opened(&self) -> usize {
        self.lock().opened
    }

    pub(crate) fn live(&self) -> usize {
        self.lock().live
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    pub(crate) fn filters(&self) -> Vec<Vec<u8>> {
        self.lock().filters.clone()
    }
}

impl HciOpener for FakeOpener {
    type Device = FakeHci;

    fn open(&self) -> Result<FakeHci> {
        let mut state = self.lock();
        if state.fail_open {
            return Err(TransportError::Open {
                what: "hci socket",
                source: io::Error::from_raw_os_error(libc::EAFNOSUPPORT),
            });
        }
        let (ours, theirs) = UnixDatagram::pair()?;
        ours.set_nonblocking(true)?;
        state.peers.push(theirs);
        state.opened += 1;
        state.live += 1;
        Ok(FakeHci {
            socket: ours,
            state: Arc::clone(&self.state),
            bound: Mutex::new(None),
        })
    }
}

pub(crate) struct FakeHci {
    socket: UnixDatagram,
    state: Arc<Mutex<FakeState>>,
    bound: Mutex<Option<u16>>,
}

impl FakeHci {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

impl HciDevice for FakeHci {
    fn device_list(&self) -> Result<Vec<DeviceStatus>> {
        Ok(self
            .lock()
            .devices
            .iter()
            .map(|info| DeviceStatus {
                dev_id: info.dev_id,
                up: info.is_up(),
            })
            .collect())
    }

    fn device_info(&self, dev_id: u16) -> Result<DeviceInfo> {
        self.lock()
            .devices
            .iter()
            .find(|info| info.dev_id == dev_id)
            .cloned()
            .ok_or(TransportError::Ioctl {
                request: "HCIGETDEVINFO",
                source: io::Error::from_raw_os_error(libc::ENODEV),
            })
    }

    fn bind_raw(&self, dev_id: u16) -> Result<()> {
        let known = self.lock().devices.iter().any(|info| info.dev_id == dev_id);
        let mut bound = self.bound.lock().unwrap();
        if !known || bound.is_some() {
            let errno = if known { libc::EALREADY } else { libc::ENODEV };
            return Err(TransportError::Bind {
                dev_id,
                source: io::Error::from_raw_os_error(errno),
            });
        }
        *bound = Some(dev_id);
        Ok(())
    }

    fn set_filter(&self, filter: &[u8]) -> Result<()> {
        self.lock().filters.push(filter.to_vec());
        Ok(())
    }

    fn send(&self, data: &[u8]) -> Result<usize> {
        self.lock().sent.push(data.to_vec());
        Ok(data.len())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        if self.lock().fail_recv {
            return Err(io::Error::from_raw_os_error(libc::ENETDOWN));
        }
        self.socket.recv(buf)
    }
}

impl AsRawFd for FakeHci {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl Drop for FakeHci {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live -= 1;
        }
    }
}
