//! Client configuration.

use std::time::Duration;

use s3p_msg::is_valid_node_id;

use crate::error::Error;

/// Default manager (our side) node id.
pub const DEF_MANAGER_ID: u8 = 0x6A;
/// Default remote node id.
pub const DEF_NODE_ID: u8 = 0x2A;
/// Default per-response timeout.
pub const DEF_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default sleep between single-byte read polls.
pub const DEF_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Settings for a [`Client`][crate::Client].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Our node id, the source of every request.
    pub manager_id: u8,
    /// The remote node id, the destination of every request.
    pub node_id: u8,
    /// Ceiling for waiting on a single response.
    pub response_timeout: Duration,
    /// Sleep between empty read polls while waiting for a frame.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            manager_id: DEF_MANAGER_ID,
            node_id: DEF_NODE_ID,
            response_timeout: DEF_RESPONSE_TIMEOUT,
            poll_interval: DEF_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Rejects reserved node ids before any traffic is attempted.
    pub fn validate(&self) -> crate::Result<()> {
        if !is_valid_node_id(self.manager_id) {
            return Err(Error::ReservedNodeId {
                id: self.manager_id,
            });
        }
        if !is_valid_node_id(self.node_id) {
            return Err(Error::ReservedNodeId { id: self.node_id });
        }
        Ok(())
    }
}
