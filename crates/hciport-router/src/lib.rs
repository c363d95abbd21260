//! Request routing and hardware event forwarding for hciport.
//!
//! The [`Router`] owns the readiness set, the framed control channel, and the
//! [`HardwareChannel`]. Requests are resolved against a fixed operation
//! table in [`registry`]; every request gets exactly one reply, and raw
//! controller packets are forwarded as `{event, Payload}` messages.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod router;

#[cfg(test)]
mod fake;

pub use config::RouterConfig;
pub use error::{Result, RouterError};
pub use lifecycle::{BoundDevice, Handle, HardwareChannel};
pub use registry::{dispatch, handle, Call, CallError, Operation};
pub use router::{Router, Shutdown, CONTROL_TOKEN, HARDWARE_TOKEN};
