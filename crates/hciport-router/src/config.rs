use std::time::Duration;

use hciport_frame::FrameConfig;
use hciport_transport::HCI_MAX_FRAME_SIZE;

/// Configuration for the event router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Most ready descriptors reported per wait.
    pub max_events: usize,
    /// Receive buffer size for hardware packets.
    pub hci_read_buffer: usize,
    /// Upper bound on one readiness wait. `None` blocks indefinitely.
    pub wait_timeout: Option<Duration>,
    /// Control channel framing limits.
    pub frame: FrameConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_events: 8,
            hci_read_buffer: HCI_MAX_FRAME_SIZE,
            wait_timeout: None,
            frame: FrameConfig::default(),
        }
    }
}
