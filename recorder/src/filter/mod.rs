pub mod ssim;
pub mod traits;

pub use ssim::SsimComparator;
pub use traits::{CompareError, FrameComparator, Verdict};
