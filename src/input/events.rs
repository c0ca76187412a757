use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Pointer input routed to the interaction layer, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Mouse moved over the surface
    Move { position: Point },
    /// Mouse left the surface
    Leave,
    /// Finger tap, or click
    Tap { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Move { position } | PointerEvent::Tap { position } => Some(*position),
            PointerEvent::Leave => None,
        }
    }
}

/// What the input device can do, probed once at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCapabilities {
    pub hover: bool,
    pub touch: bool,
}

const MOBILE_AGENT_MARKERS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

impl InputCapabilities {
    pub fn desktop() -> Self {
        Self {
            hover: true,
            touch: false,
        }
    }

    pub fn touch() -> Self {
        Self {
            hover: false,
            touch: true,
        }
    }

    /// Best-effort guess for hosts that only expose a user-agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        let agent = user_agent.to_ascii_lowercase();
        if MOBILE_AGENT_MARKERS.iter().any(|m| agent.contains(m)) {
            Self::touch()
        } else {
            Self::desktop()
        }
    }
}

impl Default for InputCapabilities {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_detection() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
        assert_eq!(InputCapabilities::from_user_agent(iphone), InputCapabilities::touch());

        let linux = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/120.0";
        assert_eq!(InputCapabilities::from_user_agent(linux), InputCapabilities::desktop());
    }

    #[test]
    fn test_event_position() {
        let p = Point::new(1.0, 2.0);
        assert_eq!(PointerEvent::Tap { position: p }.position(), Some(p));
        assert_eq!(PointerEvent::Leave.position(), None);
    }
}
