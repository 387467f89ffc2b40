//! Interactive choice of the region to watch.
//!
//! [`RegionSelector`] is a plain state machine; [`run_selection`] drives it
//! from any [`PreviewSurface`], and [`window::MinifbPreview`] is the real one.

pub mod state;
pub mod window;

use image::RgbImage;
use slidewatch_common::frame::Rectangle;
use tracing::{debug, info};

pub use state::{Overlay, Point, PointerEvent, RegionSelector, SelectionState};

/// Input delivered by a preview surface, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    /// The user asked to abort (quit key or window closed).
    Quit,
}

/// Somewhere to show the selection preview and collect pointer input from.
pub trait PreviewSurface {
    /// Show `frame` and return everything the user did since the last call.
    fn present(&mut self, frame: &RgbImage) -> Result<Vec<InputEvent>, SelectionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// A finished selection in preview coordinates.
    Selected(Rectangle),
    Cancelled,
}

/// Show the selector on `surface` until the user finishes or aborts.
pub fn run_selection(
    selector: &mut RegionSelector,
    surface: &mut impl PreviewSurface,
) -> Result<SelectionOutcome, SelectionError> {
    loop {
        let events = surface.present(selector.frame())?;
        for event in events {
            match event {
                InputEvent::Quit => {
                    info!(state = ?selector.state(), "selection cancelled");
                    return Ok(SelectionOutcome::Cancelled);
                }
                InputEvent::Pointer(pointer) => {
                    if selector.handle_event(pointer) {
                        debug!(?pointer, state = ?selector.state(), "selection updated");
                    }
                }
            }
            if selector.is_complete() {
                // Show the final shading before handing back.
                surface.present(selector.frame())?;
                return selector.rectangle().map(SelectionOutcome::Selected);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("selection is not finished (state {0:?})")]
    Incomplete(SelectionState),
    #[error("failed to open preview window: {0}")]
    Window(String),
    #[error("failed to update preview window: {0}")]
    Present(String),
}
