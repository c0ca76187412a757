//! Headless animation scheduling for marker reveals

pub mod easing;
pub mod reveal;

pub use easing::EasingType;
pub use reveal::{stagger_delays, RevealFrame, RevealTransition};
