pub mod events;
pub mod interaction;
pub mod tooltip;

pub use events::{InputCapabilities, PointerEvent};
pub use interaction::{InteractionLayer, InteractionMode};
pub use tooltip::Tooltip;
