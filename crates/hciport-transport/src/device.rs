use std::fmt;

/// Bit in `hci_dev_info.flags` / `hci_dev_req.dev_opt` set while the device is up.
pub const HCI_UP: u32 = 0;

/// Bluetooth device address, stored in the controller's little-endian order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// True for the all-zero address reported by unconfigured controllers.
    pub fn is_any(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

impl fmt::Debug for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BdAddr({self})")
    }
}

/// One entry of the controller list, in kernel enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    pub dev_id: u16,
    pub up: bool,
}

impl DeviceStatus {
    /// Decode from the `dev_opt` flags word returned by the device list.
    pub fn from_opt(dev_id: u16, dev_opt: u32) -> Self {
        Self {
            dev_id,
            up: dev_opt & (1 << HCI_UP) != 0,
        }
    }
}

/// Static description of one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub dev_id: u16,
    /// Kernel interface name, e.g. `hci0`.
    pub name: String,
    pub address: BdAddr,
    pub flags: u32,
}

impl DeviceInfo {
    pub fn is_up(&self) -> bool {
        self.flags & (1 << HCI_UP) != 0
    }
}
