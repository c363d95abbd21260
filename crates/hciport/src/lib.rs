//! Bluetooth HCI port: a child process that lets a VM drive a raw HCI socket.
//!
//! Requests arrive on stdin as 2-byte length-prefixed external-term frames,
//! replies and controller events leave on stdout the same way.
//!
//! # Crate Structure
//!
//! - [`transport`] - Raw descriptors: stdio, HCI sockets, epoll readiness
//! - [`frame`] - Two-byte length-prefixed framing
//! - [`term`] - External term format subset and message envelopes
//! - [`router`] - Operation registry, hardware lifecycle, event loop

/// Re-export transport types.
pub mod transport {
    pub use hciport_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use hciport_frame::*;
}

/// Re-export term codec types.
pub mod term {
    pub use hciport_term::*;
}

/// Re-export router types.
pub mod router {
    pub use hciport_router::*;
}
