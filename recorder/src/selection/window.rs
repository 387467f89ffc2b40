use image::RgbImage;
use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};
use tracing::debug;

use super::{InputEvent, Point, PointerEvent, PreviewSurface, SelectionError};

const TARGET_FPS: usize = 60;

/// Preview window backed by `minifb`.
///
/// Input is sampled once per [`PreviewSurface::present`] call: button edges
/// become press/release events and cursor motion with the button held
/// becomes move events. While the cursor is outside the window no pointer
/// events are produced. `Q`, `Escape` or closing the window quits.
pub struct MinifbPreview {
    window: Window,
    buffer: Vec<u32>,
    button: ButtonTracker,
}

/// Left-button state carried from one poll to the next.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ButtonTracker {
    down: bool,
    last_pos: Option<Point>,
}

impl ButtonTracker {
    /// Turn one sample of cursor position and button state into at most one
    /// pointer event. `pos` is `None` while the cursor is outside the window.
    fn update(&mut self, pos: Option<Point>, down: bool) -> Option<PointerEvent> {
        let event = match (pos, self.down, down) {
            (Some(p), false, true) => Some(PointerEvent::Press(p)),
            (Some(p), true, true) if self.last_pos != Some(p) => Some(PointerEvent::Move(p)),
            (Some(p), true, false) => Some(PointerEvent::Release(p)),
            (None, true, false) => {
                debug!(last = ?self.last_pos, "button released outside the preview, dropped");
                None
            }
            _ => None,
        };
        self.down = down;
        self.last_pos = pos;
        event
    }
}

impl MinifbPreview {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, SelectionError> {
        let mut window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions::default(),
        )
        .map_err(|e| SelectionError::Window(e.to_string()))?;
        window.set_target_fps(TARGET_FPS);

        Ok(Self {
            window,
            buffer: vec![0; width as usize * height as usize],
            button: ButtonTracker::default(),
        })
    }

    fn poll_input(&mut self) -> Vec<InputEvent> {
        if !self.window.is_open()
            || self.window.is_key_down(Key::Q)
            || self.window.is_key_down(Key::Escape)
        {
            return vec![InputEvent::Quit];
        }

        let pos = self
            .window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| Point::new(x as i32, y as i32));
        let down = self.window.get_mouse_down(MouseButton::Left);

        self.button
            .update(pos, down)
            .map(InputEvent::Pointer)
            .into_iter()
            .collect()
    }
}

impl PreviewSurface for MinifbPreview {
    fn present(&mut self, frame: &RgbImage) -> Result<Vec<InputEvent>, SelectionError> {
        let (width, height) = frame.dimensions();
        self.buffer.resize(width as usize * height as usize, 0);
        for (dst, px) in self.buffer.iter_mut().zip(frame.pixels()) {
            let [r, g, b] = px.0;
            *dst = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
        }
        self.window
            .update_with_buffer(&self.buffer, width as usize, height as usize)
            .map_err(|e| SelectionError::Present(e.to_string()))?;

        Ok(self.poll_input())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32) -> Option<Point> {
        Some(Point::new(x, y))
    }

    #[test]
    fn press_drag_release() {
        let mut button = ButtonTracker::default();
        assert_eq!(button.update(at(5, 5), false), None);
        assert_eq!(button.update(at(5, 5), true), Some(PointerEvent::Press(Point::new(5, 5))));
        assert_eq!(button.update(at(9, 7), true), Some(PointerEvent::Move(Point::new(9, 7))));
        assert_eq!(
            button.update(at(12, 8), false),
            Some(PointerEvent::Release(Point::new(12, 8)))
        );
        assert_eq!(button.update(at(12, 8), false), None);
    }

    #[test]
    fn holding_still_emits_no_moves() {
        let mut button = ButtonTracker::default();
        button.update(at(3, 3), true);
        assert_eq!(button.update(at(3, 3), true), None);
        assert_eq!(button.update(at(3, 3), true), None);
    }

    #[test]
    fn release_outside_the_window_is_dropped() {
        let mut button = ButtonTracker::default();
        button.update(at(10, 10), true);
        button.update(at(20, 20), true);
        assert_eq!(button.update(None, false), None);
        assert!(!button.down);

        // The next press inside the window is still seen as a fresh press.
        assert_eq!(
            button.update(at(30, 30), true),
            Some(PointerEvent::Press(Point::new(30, 30)))
        );
    }

    #[test]
    fn drag_that_leaves_and_returns_resumes_moving() {
        let mut button = ButtonTracker::default();
        button.update(at(10, 10), true);
        assert_eq!(button.update(None, true), None);
        assert_eq!(
            button.update(at(15, 15), true),
            Some(PointerEvent::Move(Point::new(15, 15)))
        );
    }
}
