/// An axis-aligned region of a raster, in pixel coordinates.
///
/// The region covers columns `x_start..x_end` and rows `y_start..y_end`
/// (end-exclusive). `x_end >= x_start` and `y_end >= y_start` always hold:
/// the only way to build one from arbitrary corners is
/// [`Rectangle::from_corners`], which normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    x_start: u32,
    y_start: u32,
    x_end: u32,
    y_end: u32,
}

impl Rectangle {
    /// Build a rectangle from two opposite corners given in any order.
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            x_start: a.0.min(b.0),
            y_start: a.1.min(b.1),
            x_end: a.0.max(b.0),
            y_end: a.1.max(b.1),
        }
    }

    /// Build a rectangle from its origin and size.
    pub fn from_origin_size(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::from_corners((x, y), (x.saturating_add(width), y.saturating_add(height)))
    }

    pub fn x_start(&self) -> u32 {
        self.x_start
    }

    pub fn y_start(&self) -> u32 {
        self.y_start
    }

    pub fn x_end(&self) -> u32 {
        self.x_end
    }

    pub fn y_end(&self) -> u32 {
        self.y_end
    }

    pub fn width(&self) -> u32 {
        self.x_end - self.x_start
    }

    pub fn height(&self) -> u32 {
        self.y_end - self.y_start
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Map a rectangle taken on a preview scaled by `factor` back to the
    /// coordinates of the unscaled source. Coordinates are truncated.
    pub fn unscale(&self, factor: f64) -> Self {
        self.unscale_axes(factor, factor)
    }

    /// [`Rectangle::unscale`] for a preview scaled differently along each axis.
    pub fn unscale_axes(&self, factor_x: f64, factor_y: f64) -> Self {
        let map = |v: u32, factor: f64| (v as f64 / factor) as u32;
        Self::from_corners(
            (map(self.x_start, factor_x), map(self.y_start, factor_y)),
            (map(self.x_end, factor_x), map(self.y_end, factor_y)),
        )
    }

    /// Intersect with a `width` x `height` raster anchored at the origin.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        Self::from_corners(
            (self.x_start.min(width), self.y_start.min(height)),
            (self.x_end.min(width), self.y_end.min(height)),
        )
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})..({}, {}) [{}x{}]",
            self.x_start,
            self.y_start,
            self.x_end,
            self.y_end,
            self.width(),
            self.height()
        )
    }
}

/// A captured raster together with when it was taken.
///
/// `seq` is 0 for the baseline and then counts ticks of the watch loop.
#[derive(Debug, Clone)]
pub struct Frame<I> {
    pub image: I,
    pub captured_at_ms: i64,
    pub seq: u64,
}

impl<I> Frame<I> {
    pub fn new(image: I, captured_at_ms: i64, seq: u64) -> Self {
        Self {
            image,
            captured_at_ms,
            seq,
        }
    }

    /// Stamp `image` with the current wall-clock time.
    pub fn now(image: I, seq: u64) -> Self {
        Self::new(image, chrono::Utc::now().timestamp_millis(), seq)
    }

    /// Capture time formatted for log lines, e.g. `2026-02-18T09:30:00.000Z`.
    pub fn captured_at(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.captured_at_ms)
            .unwrap_or_else(chrono::Utc::now)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string()
    }
}
