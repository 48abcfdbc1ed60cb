//! Resizable list pane.
//!
//! The splitter drag is a two-state machine: `Idle` and `Dragging`. A drag captures
//! the pointer that started it; events from any other pointer are ignored. Releasing
//! or cancelling the captured pointer ends the drag and yields the width to persist,
//! exactly once.

use serde::{Deserialize, Serialize};

/// Primary mouse button / pen contact / touch.
pub const PRIMARY_BUTTON: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaneBounds {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl Default for PaneBounds {
    fn default() -> Self {
        Self {
            min: 120.0,
            max: 520.0,
            default: 280.0,
        }
    }
}

impl PaneBounds {
    pub fn clamp(&self, width: f64) -> f64 {
        width.max(self.min).min(self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PaneResize {
    #[default]
    Idle,
    Dragging {
        pointer_id: PointerId,
        anchor_x: f64,
        start_width: f64,
    },
}

/// What the owner should do after feeding an event to the gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    Ignored,
    Started,
    /// Show this width; the drag continues.
    Resized(f64),
    /// The drag ended; show and persist this width.
    Finished(f64),
}

impl PaneResize {
    pub fn is_dragging(&self) -> bool {
        matches!(self, PaneResize::Dragging { .. })
    }

    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        button: u16,
        x: f64,
        current_width: f64,
    ) -> ResizeOutcome {
        if button != PRIMARY_BUTTON || self.is_dragging() {
            return ResizeOutcome::Ignored;
        }
        *self = PaneResize::Dragging {
            pointer_id,
            anchor_x: x,
            start_width: current_width,
        };
        ResizeOutcome::Started
    }

    pub fn pointer_move(
        &mut self,
        pointer_id: PointerId,
        x: f64,
        bounds: &PaneBounds,
    ) -> ResizeOutcome {
        match *self {
            PaneResize::Dragging {
                pointer_id: captured,
                anchor_x,
                start_width,
            } if captured == pointer_id => {
                ResizeOutcome::Resized(bounds.clamp(start_width + x - anchor_x))
            }
            _ => ResizeOutcome::Ignored,
        }
    }

    pub fn pointer_up(
        &mut self,
        pointer_id: PointerId,
        x: f64,
        bounds: &PaneBounds,
    ) -> ResizeOutcome {
        match self.pointer_move(pointer_id, x, bounds) {
            ResizeOutcome::Resized(width) => {
                *self = PaneResize::Idle;
                ResizeOutcome::Finished(width)
            }
            outcome => outcome,
        }
    }

    /// Ends the drag at whatever width is currently shown.
    pub fn pointer_cancel(
        &mut self,
        pointer_id: PointerId,
        current_width: f64,
        bounds: &PaneBounds,
    ) -> ResizeOutcome {
        match *self {
            PaneResize::Dragging { pointer_id: captured, .. } if captured == pointer_id => {
                *self = PaneResize::Idle;
                ResizeOutcome::Finished(bounds.clamp(current_width))
            }
            _ => ResizeOutcome::Ignored,
        }
    }
}
