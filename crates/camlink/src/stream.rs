//! Logical stream identities
//!
//! A run supervises exactly two independent camera-to-destination paths.
//! Each is identified by a role that resolves to a fixed UDP port, a capture
//! device, and a human-readable label.

use crate::config::LinkConfig;
use std::fmt;

/// One of the two logical camera streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamRole {
    CameraOne,
    CameraTwo,
}

impl StreamRole {
    /// Both roles in their fixed launch order
    pub const ALL: [StreamRole; 2] = [StreamRole::CameraOne, StreamRole::CameraTwo];

    /// Short label used in log prefixes and filenames
    pub fn label(&self) -> &'static str {
        match self {
            StreamRole::CameraOne => "camera1",
            StreamRole::CameraTwo => "camera2",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            StreamRole::CameraOne => "Camera 1",
            StreamRole::CameraTwo => "Camera 2",
        }
    }

    /// UDP rendezvous port for this stream
    pub fn stream_port(&self, config: &LinkConfig) -> u16 {
        match self {
            StreamRole::CameraOne => config.camera_one_port,
            StreamRole::CameraTwo => config.camera_two_port,
        }
    }

    /// Localhost relay port used by the forward sink mode
    pub fn relay_port(&self, config: &LinkConfig) -> u16 {
        match self {
            StreamRole::CameraOne => config.relay_one_port,
            StreamRole::CameraTwo => config.relay_two_port,
        }
    }

    /// Capture device serving this stream on the edge device
    pub fn device<'a>(&self, config: &'a LinkConfig) -> &'a str {
        match self {
            StreamRole::CameraOne => &config.camera_one_device,
            StreamRole::CameraTwo => &config.camera_two_device,
        }
    }
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_resolve_distinct_endpoints() {
        let config = LinkConfig::default();
        assert_eq!(StreamRole::CameraOne.stream_port(&config), 5000);
        assert_eq!(StreamRole::CameraTwo.stream_port(&config), 5001);
        assert_eq!(StreamRole::CameraOne.device(&config), "/dev/video0");
        assert_eq!(StreamRole::CameraTwo.device(&config), "/dev/video2");
        assert_ne!(
            StreamRole::CameraOne.relay_port(&config),
            StreamRole::CameraTwo.relay_port(&config)
        );
    }

    #[test]
    fn test_launch_order_is_fixed() {
        assert_eq!(
            StreamRole::ALL,
            [StreamRole::CameraOne, StreamRole::CameraTwo]
        );
    }
}
