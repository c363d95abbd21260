use std::os::fd::AsRawFd;

use crate::device::{DeviceInfo, DeviceStatus};
use crate::error::Result;

/// An open HCI socket and the controller operations issued through it.
///
/// The descriptor returned by [`AsRawFd`] is what the router registers for
/// readiness. Implementations must be non-blocking for [`HciDevice::recv`]:
/// an empty receive queue reports `ErrorKind::WouldBlock`.
pub trait HciDevice: AsRawFd {
    /// Enumerate controllers in the order the kernel reports them.
    fn device_list(&self) -> Result<Vec<DeviceStatus>>;

    /// Query a single controller.
    fn device_info(&self, dev_id: u16) -> Result<DeviceInfo>;

    /// Bind this socket to a controller's raw channel.
    fn bind_raw(&self, dev_id: u16) -> Result<()>;

    /// Install an event filter; the bytes are passed to the kernel as-is.
    fn set_filter(&self, filter: &[u8]) -> Result<()>;

    /// Write one raw packet.
    fn send(&self, data: &[u8]) -> Result<usize>;

    /// Read one raw packet without blocking.
    fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize>;
}

/// Factory for fresh [`HciDevice`] handles.
pub trait HciOpener {
    type Device: HciDevice;

    fn open(&self) -> Result<Self::Device>;
}
