use std::time::Duration;

use image::RgbImage;
use slidewatch_common::frame::{Frame, Rectangle};
use tracing::{debug, info, warn};

use crate::capture::{CaptureError, ScreenSource};
use crate::filter::{CompareError, FrameComparator, Verdict};
use crate::stop::StopSignal;
use crate::storage::{FrameStore, FrameWriter, PngWriter};

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub ticks: u64,
    pub saved: u64,
    pub failed: u64,
}

/// Samples a screen region on a fixed delay and saves every sample that
/// differs from the one before it.
///
/// The reference is always the most recent sample, saved or not, so slow
/// drift is followed without ever producing a file.
pub struct Watcher<S, C, W = PngWriter> {
    source: S,
    region: Rectangle,
    comparator: C,
    store: FrameStore<W>,
    delay: Duration,
}

impl<S, C, W> Watcher<S, C, W>
where
    S: ScreenSource,
    C: FrameComparator,
    W: FrameWriter,
{
    pub fn new(
        source: S,
        region: Rectangle,
        comparator: C,
        store: FrameStore<W>,
        delay: Duration,
    ) -> Self {
        Self {
            source,
            region,
            comparator,
            store,
            delay,
        }
    }

    /// Run until `stop` is observed at the end of a tick.
    ///
    /// The first sample only becomes the reference; nothing is written until
    /// the first change. Failed saves are logged and counted. Capture and
    /// comparison errors end the loop.
    pub async fn run(&mut self, stop: &StopSignal) -> Result<WatchSummary, WatchError> {
        let mut reference = Frame::now(self.sample()?, 0);
        info!(
            region = %self.region,
            width = reference.image.width(),
            height = reference.image.height(),
            comparator = self.comparator.name(),
            delay_ms = self.delay.as_millis() as u64,
            "baseline captured, watching for changes"
        );

        let mut summary = WatchSummary::default();
        loop {
            tokio::time::sleep(self.delay).await;
            summary.ticks += 1;

            let frame = Frame::now(self.sample()?, summary.ticks);
            let score = self.comparator.compare(&frame.image, &reference.image)?;
            let verdict = self.comparator.classify(score);
            debug!(
                seq = frame.seq,
                score = format!("{:.4}", score),
                ?verdict,
                "frame comparison"
            );

            if verdict == Verdict::Different {
                match self.store.save(&frame.image) {
                    Ok(path) => {
                        summary.saved += 1;
                        info!(
                            path = %path.display(),
                            seq = frame.seq,
                            captured_at = frame.captured_at(),
                            score = format!("{:.4}", score),
                            "content changed, frame saved"
                        );
                    }
                    Err(e) => {
                        summary.failed += 1;
                        warn!(error = %e, seq = frame.seq, "failed to save changed frame, continuing");
                    }
                }
            }
            reference = frame;

            if stop.is_triggered() {
                info!(
                    ticks = summary.ticks,
                    saved = summary.saved,
                    failed = summary.failed,
                    "stop requested, leaving watch loop"
                );
                return Ok(summary);
            }
        }
    }

    fn sample(&mut self) -> Result<RgbImage, CaptureError> {
        self.source.capture(Some(self.region), None)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Compare(#[from] CompareError),
}
