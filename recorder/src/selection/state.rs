use image::{Rgb, RgbImage};
use slidewatch_common::frame::Rectangle;
use tracing::debug;

use super::SelectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Selecting,
    Complete,
}

/// A pointer position in preview pixels. May lie outside the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press(Point),
    Move(Point),
    Release(Point),
}

/// Mask blended over the selected area while dragging.
#[derive(Debug, Clone, Copy)]
pub struct Overlay {
    pub color: Rgb<u8>,
    pub alpha: f32,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            color: Rgb([0, 0, 0]),
            alpha: 0.5,
        }
    }
}

/// Turns a press-drag-release gesture over a preview into a [`Rectangle`].
///
/// The original preview is never modified; [`RegionSelector::frame`] returns
/// a copy with the current selection shaded in.
pub struct RegionSelector {
    state: SelectionState,
    preview: RgbImage,
    frame: RgbImage,
    overlay: Overlay,
    start: (u32, u32),
    end: (u32, u32),
}

impl RegionSelector {
    pub fn new(preview: RgbImage, overlay: Overlay) -> Self {
        Self {
            state: SelectionState::Idle,
            frame: preview.clone(),
            preview,
            overlay,
            start: (0, 0),
            end: (0, 0),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SelectionState::Complete
    }

    /// What the preview window should currently show.
    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }

    /// The finished selection, in preview coordinates.
    pub fn rectangle(&self) -> Result<Rectangle, SelectionError> {
        if !self.is_complete() {
            return Err(SelectionError::Incomplete(self.state));
        }
        Ok(self.current_rectangle())
    }

    /// Feed one pointer event. Returns whether the state or the shaded
    /// area changed.
    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        if self.state == SelectionState::Complete {
            return false;
        }

        let (kind, point) = match event {
            PointerEvent::Press(p) => ("press", p),
            PointerEvent::Move(p) => ("move", p),
            PointerEvent::Release(p) => ("release", p),
        };
        let Some(pos) = self.in_bounds(point) else {
            debug!(kind, x = point.x, y = point.y, "pointer outside preview, ignored");
            return false;
        };

        match (self.state, event) {
            (_, PointerEvent::Press(_)) => {
                self.start = pos;
                self.end = pos;
                self.state = SelectionState::Selecting;
            }
            (SelectionState::Selecting, PointerEvent::Move(_)) => {
                self.end = pos;
            }
            (SelectionState::Selecting, PointerEvent::Release(_)) => {
                self.end = pos;
                self.state = SelectionState::Complete;
                debug!(
                    selection = %self.current_rectangle(),
                    "selection complete"
                );
            }
            _ => return false,
        }

        self.redraw();
        true
    }

    fn in_bounds(&self, p: Point) -> Option<(u32, u32)> {
        let x = u32::try_from(p.x).ok()?;
        let y = u32::try_from(p.y).ok()?;
        (x < self.preview.width() && y < self.preview.height()).then_some((x, y))
    }

    fn current_rectangle(&self) -> Rectangle {
        Rectangle::from_corners(self.start, self.end)
    }

    fn redraw(&mut self) {
        self.frame.clone_from(&self.preview);
        let rect = self.current_rectangle();
        shade(&mut self.frame, rect, self.overlay);
    }
}

/// Alpha-blend `overlay.color` into `rect` of `image`.
pub fn shade(image: &mut RgbImage, rect: Rectangle, overlay: Overlay) {
    let rect = rect.clamp_to(image.width(), image.height());
    let alpha = overlay.alpha.clamp(0.0, 1.0);
    for y in rect.y_start()..rect.y_end() {
        for x in rect.x_start()..rect.x_end() {
            let px = image.get_pixel_mut(x, y);
            for (c, m) in px.0.iter_mut().zip(overlay.color.0) {
                *c = (*c as f32 * (1.0 - alpha) + m as f32 * alpha).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([200, 200, 200]);

    fn selector() -> RegionSelector {
        RegionSelector::new(RgbImage::from_pixel(100, 80, WHITE), Overlay::default())
    }

    fn press(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Press(Point::new(x, y))
    }

    fn drag(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Move(Point::new(x, y))
    }

    fn release(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Release(Point::new(x, y))
    }

    #[test]
    fn idle_only_leaves_on_press() {
        let mut sel = selector();
        assert!(!sel.handle_event(drag(10, 10)));
        assert!(!sel.handle_event(release(20, 20)));
        assert_eq!(sel.state(), SelectionState::Idle);

        assert!(sel.handle_event(press(10, 10)));
        assert_eq!(sel.state(), SelectionState::Selecting);
    }

    #[test]
    fn rectangle_is_an_error_before_completion() {
        let mut sel = selector();
        assert!(matches!(
            sel.rectangle(),
            Err(SelectionError::Incomplete(SelectionState::Idle))
        ));
        sel.handle_event(press(5, 5));
        sel.handle_event(drag(30, 30));
        assert!(matches!(
            sel.rectangle(),
            Err(SelectionError::Incomplete(SelectionState::Selecting))
        ));
    }

    #[test]
    fn top_left_to_bottom_right() {
        let mut sel = selector();
        sel.handle_event(press(10, 20));
        sel.handle_event(drag(40, 50));
        sel.handle_event(release(60, 70));
        assert!(sel.is_complete());
        assert_eq!(sel.rectangle().unwrap(), Rectangle::from_corners((10, 20), (60, 70)));
    }

    #[test]
    fn bottom_right_to_top_left_is_normalized() {
        let mut sel = selector();
        sel.handle_event(press(90, 70));
        sel.handle_event(drag(50, 40));
        sel.handle_event(release(5, 8));

        let rect = sel.rectangle().unwrap();
        assert!(rect.x_end() >= rect.x_start());
        assert!(rect.y_end() >= rect.y_start());
        assert_eq!(rect, Rectangle::from_corners((5, 8), (90, 70)));
    }

    #[test]
    fn out_of_bounds_events_are_ignored() {
        let mut sel = selector();
        assert!(!sel.handle_event(press(-1, 10)));
        assert!(!sel.handle_event(press(100, 10)));
        assert_eq!(sel.state(), SelectionState::Idle);

        sel.handle_event(press(10, 10));
        assert!(!sel.handle_event(drag(10, 80)));
        assert!(!sel.handle_event(release(500, 500)));
        assert_eq!(sel.state(), SelectionState::Selecting);

        sel.handle_event(release(99, 79));
        assert_eq!(sel.rectangle().unwrap(), Rectangle::from_corners((10, 10), (99, 79)));
    }

    #[test]
    fn complete_is_terminal() {
        let mut sel = selector();
        sel.handle_event(press(10, 10));
        sel.handle_event(release(20, 20));
        let rect = sel.rectangle().unwrap();

        assert!(!sel.handle_event(press(50, 50)));
        assert!(!sel.handle_event(drag(60, 60)));
        assert!(!sel.handle_event(release(70, 70)));
        assert_eq!(sel.rectangle().unwrap(), rect);
    }

    #[test]
    fn second_press_restarts_the_drag() {
        let mut sel = selector();
        sel.handle_event(press(10, 10));
        sel.handle_event(drag(30, 30));
        sel.handle_event(press(50, 50));
        sel.handle_event(release(60, 55));
        assert_eq!(sel.rectangle().unwrap(), Rectangle::from_corners((50, 50), (60, 55)));
    }

    #[test]
    fn overlay_shades_only_the_selection() {
        let mut sel = selector();
        sel.handle_event(press(30, 30));
        sel.handle_event(drag(10, 10));

        let frame = sel.frame();
        assert_eq!(frame.get_pixel(15, 15), &Rgb([100, 100, 100]));
        assert_eq!(frame.get_pixel(5, 5), &WHITE);
        assert_eq!(frame.get_pixel(30, 30), &WHITE);
    }

    #[test]
    fn overlay_is_redrawn_from_the_clean_preview() {
        let mut sel = selector();
        sel.handle_event(press(0, 0));
        sel.handle_event(drag(50, 50));
        sel.handle_event(drag(20, 20));

        let frame = sel.frame();
        // Shaded by the first move, but no longer selected.
        assert_eq!(frame.get_pixel(40, 40), &WHITE);
        // Shaded once, not twice.
        assert_eq!(frame.get_pixel(10, 10), &Rgb([100, 100, 100]));
    }

    #[test]
    fn shade_with_custom_mask() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let overlay = Overlay {
            color: Rgb([255, 0, 100]),
            alpha: 0.25,
        };
        shade(&mut img, Rectangle::from_corners((0, 0), (2, 2)), overlay);
        assert_eq!(img.get_pixel(1, 1), &Rgb([64, 0, 25]));
        assert_eq!(img.get_pixel(2, 2), &Rgb([0, 0, 0]));
    }
}
