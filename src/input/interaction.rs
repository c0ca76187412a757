//! Hover and tap tooltips over a rendered scene.
//!
//! The interaction mode is fixed when the layer is created. Switching modes
//! per event would make tooltips flicker on hybrid devices.

use crate::{
    core::constants::TOUCH_SLOP_PX,
    input::{
        events::{InputCapabilities, PointerEvent},
        tooltip::{anchor_for, Tooltip},
    },
    layers::scene::{Scene, ShapeId},
};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    /// Tooltip follows the pointer and clears when it leaves a shape
    Hover,
    /// Tapping a shape toggles its tooltip
    Tap,
}

impl InteractionMode {
    pub fn select(capabilities: &InputCapabilities) -> Self {
        if capabilities.touch {
            InteractionMode::Tap
        } else {
            InteractionMode::Hover
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionLayer {
    mode: InteractionMode,
    tolerance: f64,
    active: Option<Tooltip>,
}

impl InteractionLayer {
    pub fn new(capabilities: &InputCapabilities) -> Self {
        let mode = InteractionMode::select(capabilities);
        let tolerance = match mode {
            InteractionMode::Hover => 0.0,
            InteractionMode::Tap => TOUCH_SLOP_PX,
        };
        debug!("interaction mode {mode:?}");
        Self {
            mode,
            tolerance,
            active: None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.active.as_ref()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Applies one pointer event and returns the tooltip now showing.
    /// Events that do not belong to the current mode are ignored.
    pub fn handle<F>(&mut self, event: &PointerEvent, scene: &Scene, content_for: F) -> Option<&Tooltip>
    where
        F: Fn(&ShapeId) -> String,
    {
        match (self.mode, event) {
            (InteractionMode::Hover, PointerEvent::Move { position }) => {
                self.active = scene.hit_test(position, self.tolerance).map(|shape| Tooltip {
                    content: content_for(&shape),
                    anchor: anchor_for(position),
                    shape,
                });
            }
            (InteractionMode::Hover, PointerEvent::Leave) => self.active = None,
            (InteractionMode::Tap, PointerEvent::Tap { position }) => {
                let hit = scene.hit_test(position, self.tolerance);
                let same_shape = matches!(
                    (&hit, &self.active),
                    (Some(shape), Some(open)) if *shape == open.shape
                );
                self.active = match hit {
                    Some(shape) if !same_shape => Some(Tooltip {
                        content: content_for(&shape),
                        anchor: anchor_for(position),
                        shape,
                    }),
                    _ => None,
                };
            }
            _ => {}
        }
        self.active.as_ref()
    }

    /// Keeps the open tooltip in step with a freshly built scene: dropped if
    /// its shape is gone, content refreshed otherwise.
    pub fn refresh<F>(&mut self, scene: &Scene, content_for: F)
    where
        F: Fn(&ShapeId) -> String,
    {
        if let Some(tooltip) = self.active.as_mut() {
            if scene.contains(&tooltip.shape) {
                tooltip.content = content_for(&tooltip.shape);
            } else {
                self.active = None;
            }
        }
    }
}
