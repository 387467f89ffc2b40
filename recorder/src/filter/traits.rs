use image::RgbImage;

/// Outcome of comparing a new sample with the reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Same,
    Different,
}

/// Scene-change detection between two equally sized rasters.
pub trait FrameComparator {
    /// Similarity of `current` to `reference`; 1.0 means identical.
    fn compare(&self, current: &RgbImage, reference: &RgbImage) -> Result<f64, CompareError>;

    /// Turn a score into a verdict. Must depend on nothing but `score`.
    fn classify(&self, score: f64) -> Verdict;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("cannot compare a {current:?} frame with a {reference:?} reference")]
    DimensionMismatch {
        current: (u32, u32),
        reference: (u32, u32),
    },
    #[error("similarity metric failed: {0}")]
    Metric(String),
}
