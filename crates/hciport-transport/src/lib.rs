//! Descriptor-level plumbing for hciport.
//!
//! This is the lowest layer. It owns every raw file descriptor the port
//! touches:
//! - the control channel (stdin/stdout, or any pair of descriptors)
//! - Linux Bluetooth raw HCI sockets
//! - the epoll readiness set that multiplexes them
//!
//! Controller operations are expressed through the [`HciDevice`] and
//! [`HciOpener`] traits so higher layers can run against a substitute backend.

pub mod device;
pub mod error;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod hci;
#[cfg(target_os = "linux")]
pub mod poll;
#[cfg(unix)]
pub mod stdio;

pub use device::{BdAddr, DeviceInfo, DeviceStatus};
pub use error::{os_reason, Result, TransportError};
pub use traits::{HciDevice, HciOpener};

#[cfg(target_os = "linux")]
pub use hci::{HciSocket, SystemHci, HCI_MAX_FRAME_SIZE};
#[cfg(target_os = "linux")]
pub use poll::{Readiness, Trigger};
#[cfg(unix)]
pub use stdio::ControlChannel;
