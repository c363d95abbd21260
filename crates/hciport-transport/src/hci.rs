//! Linux Bluetooth raw HCI sockets.

use std::io;
use std::mem::size_of;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use tracing::debug;

use crate::device::{BdAddr, DeviceInfo, DeviceStatus};
use crate::error::{Result, TransportError};
use crate::traits::{HciDevice, HciOpener};

/// Largest packet the kernel hands out on a raw HCI socket (ACL max + header).
pub const HCI_MAX_FRAME_SIZE: usize = 1028;

/// Maximum controllers returned by one device-list request.
pub const HCI_MAX_DEV: usize = 16;

const BTPROTO_HCI: libc::c_int = 1;
const SOL_HCI: libc::c_int = 0;
const HCI_FILTER: libc::c_int = 2;
const HCI_CHANNEL_RAW: u16 = 0;

// _IOR('H', 210, int) and _IOR('H', 211, int).
const HCIGETDEVLIST: libc::c_ulong = 0x8004_48d2;
const HCIGETDEVINFO: libc::c_ulong = 0x8004_48d3;

#[repr(C)]
#[allow(dead_code)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct HciDevReq {
    dev_id: u16,
    dev_opt: u32,
}

#[repr(C)]
#[derive(Default)]
struct HciDevListReq {
    dev_num: u16,
    dev_req: [HciDevReq; HCI_MAX_DEV],
}

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct HciDevStats {
    err_rx: u32,
    err_tx: u32,
    cmd_tx: u32,
    evt_rx: u32,
    acl_tx: u32,
    acl_rx: u32,
    sco_tx: u32,
    sco_rx: u32,
    byte_rx: u32,
    byte_tx: u32,
}

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct HciDevInfo {
    dev_id: u16,
    name: [u8; 8],
    bdaddr: [u8; 6],
    flags: u32,
    dev_type: u8,
    features: [u8; 8],
    pkt_type: u32,
    link_policy: u32,
    link_mode: u32,
    acl_mtu: u16,
    acl_pkts: u16,
    sco_mtu: u16,
    sco_pkts: u16,
    stat: HciDevStats,
}

/// A raw, non-blocking HCI socket.
///
/// The descriptor is closed when the socket is dropped, which also removes
/// it from any epoll set it was registered in.
#[derive(Debug)]
pub struct HciSocket {
    fd: OwnedFd,
}

impl HciSocket {
    /// Open an unbound raw HCI socket.
    pub fn open() -> Result<Self> {
        // SAFETY: socket(2) takes no pointers; the result is checked before use.
        let raw = unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC | libc::SOCK_NONBLOCK,
                BTPROTO_HCI,
            )
        };
        if raw < 0 {
            return Err(TransportError::Open {
                what: "hci socket",
                source: io::Error::last_os_error(),
            });
        }

        // SAFETY: `raw` is a freshly created descriptor not owned by anything else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        debug!(fd = raw, "opened hci socket");
        Ok(Self { fd })
    }

    fn ioctl<T>(&self, request: libc::c_ulong, name: &'static str, arg: &mut T) -> Result<()> {
        // SAFETY: `arg` points to a live, correctly laid out #[repr(C)] struct that the
        // kernel reads and writes for exactly this request.
        let rc = unsafe { libc::ioctl(self.fd.as_raw_fd(), request as _, arg as *mut T) };
        if rc < 0 {
            return Err(TransportError::Ioctl {
                request: name,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

impl HciDevice for HciSocket {
    fn device_list(&self) -> Result<Vec<DeviceStatus>> {
        let mut req = HciDevListReq {
            dev_num: HCI_MAX_DEV as u16,
            ..HciDevListReq::default()
        };
        self.ioctl(HCIGETDEVLIST, "HCIGETDEVLIST", &mut req)?;

        let count = usize::from(req.dev_num).min(HCI_MAX_DEV);
        Ok(req.dev_req[..count]
            .iter()
            .map(|r| DeviceStatus::from_opt(r.dev_id, r.dev_opt))
            .collect())
    }

    fn device_info(&self, dev_id: u16) -> Result<DeviceInfo> {
        let mut info = HciDevInfo {
            dev_id,
            ..HciDevInfo::default()
        };
        self.ioctl(HCIGETDEVINFO, "HCIGETDEVINFO", &mut info)?;

        let name_len = info
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(info.name.len());
        Ok(DeviceInfo {
            dev_id: info.dev_id,
            name: String::from_utf8_lossy(&info.name[..name_len]).into_owned(),
            address: BdAddr(info.bdaddr),
            flags: info.flags,
        })
    }

    fn bind_raw(&self, dev_id: u16) -> Result<()> {
        let addr = SockaddrHci {
            hci_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW,
        };

        // SAFETY: `addr` is a valid sockaddr_hci and the length matches its size.
        let rc = unsafe {
            libc::bind(
                self.fd.as_raw_fd(),
                (&addr as *const SockaddrHci).cast::<libc::sockaddr>(),
                size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(TransportError::Bind {
                dev_id,
                source: io::Error::last_os_error(),
            });
        }
        debug!(fd = self.fd.as_raw_fd(), dev_id, "bound hci socket");
        Ok(())
    }

    fn set_filter(&self, filter: &[u8]) -> Result<()> {
        // SAFETY: the pointer and length describe the caller's slice, which the
        // kernel only reads.
        let rc = unsafe {
            libc::setsockopt(
                self.fd.as_raw_fd(),
                SOL_HCI,
                HCI_FILTER,
                filter.as_ptr().cast::<libc::c_void>(),
                filter.len() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(TransportError::Ioctl {
                request: "HCI_FILTER",
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn send(&self, data: &[u8]) -> Result<usize> {
        loop {
            // SAFETY: the pointer and length describe the caller's slice.
            let n = unsafe {
                libc::write(
                    self.fd.as_raw_fd(),
                    data.as_ptr().cast::<libc::c_void>(),
                    data.len(),
                )
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(TransportError::Io(err));
            }
        }
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            // SAFETY: the pointer and length describe the caller's writable slice.
            let n = unsafe {
                libc::read(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                )
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for HciSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Opens real kernel HCI sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHci;

impl HciOpener for SystemHci {
    type Device = HciSocket;

    fn open(&self) -> Result<HciSocket> {
        HciSocket::open()
    }
}
